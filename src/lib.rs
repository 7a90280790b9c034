pub(crate) mod data {
    pub(crate) mod models {
        pub(crate) mod verify_receipt {
            pub(crate) mod common;
            pub(crate) mod response_shape;
        }
    }
}

pub mod domain {
    pub mod entities {
        pub mod environment;
        pub mod pending_renewal_info;
        pub mod purchase_item;
        pub mod receipt_response;
        pub mod status_code;
    }
}

pub mod constants;
pub mod errors;

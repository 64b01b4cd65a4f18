//! HTTP protocol layer module
//!
//! Response builders shared by the request handler, decoupled from routing.

pub mod response;

pub use response::{
    build_400_response, build_404_response, build_405_response, build_413_response,
    build_500_response, build_detail_response, build_json_response, build_options_response,
    set_server_header, strip_body,
};

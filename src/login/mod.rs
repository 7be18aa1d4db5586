pub mod flow;

pub use flow::{LoginCredentials, LoginFlow, parse_login_credentials, parse_login_flow};

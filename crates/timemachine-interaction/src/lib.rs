//! Backend access for TimeMachine: the HTTP gateway and token claim decoding.

pub mod http_gateway;
pub mod jwt;

pub use http_gateway::HttpReflectionGateway;
pub use jwt::{TokenClaims, decode_claims};

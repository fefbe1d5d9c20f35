use crate::builder::JwtBuilder;
use crate::claims::Claims;
use crate::parser::JwtParserBuilder;
use crate::token::Header;

/// Entry points for building and parsing tokens
pub struct Jwts;

impl Jwts {
    pub fn builder() -> JwtBuilder {
        JwtBuilder::new()
    }

    pub fn parser_builder() -> JwtParserBuilder {
        JwtParserBuilder::new()
    }

    /// Empty header
    pub fn header() -> Header {
        Header::new()
    }

    /// Empty claims
    pub fn claims() -> Claims {
        Claims::new()
    }
}

use thiserror::Error;

/// The request methods the dispatcher routes to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

/// Value of the `Allow` header sent with `405 Method Not Allowed`.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, HEAD";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported method: {method}")]
pub struct UnsupportedMethod {
    method: http::Method,
}

impl UnsupportedMethod {
    pub fn method(&self) -> &http::Method {
        &self.method
    }
}

impl Method {
    pub const ALL: [Method; 5] = [Method::Get, Method::Post, Method::Put, Method::Delete, Method::Head];

    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }

    /// Position of this method in [`Method::ALL`] and in the dispatch table.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = UnsupportedMethod;

    /// Tokens are matched case-sensitively, `get` is an extension method, not `GET`.
    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        match method.as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            _ => Err(UnsupportedMethod { method: method.clone() }),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Head => http::Method::HEAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from() {
        for method in Method::ALL {
            let http_method = http::Method::from(method);
            assert_eq!(Method::try_from(&http_method), Ok(method));
            assert_eq!(http_method.as_str(), method.as_str());
        }
    }

    #[test]
    fn test_method_from_error() {
        {
            let result = Method::try_from(&http::Method::PATCH);
            assert_eq!(result.unwrap_err().method(), &http::Method::PATCH);
        }

        {
            let lowercase = http::Method::from_bytes(b"get").unwrap();
            assert!(Method::try_from(&lowercase).is_err());
        }
    }

    #[test]
    fn allow_header_lists_every_method() {
        let joined = Method::ALL.iter().map(|method| method.as_str()).collect::<Vec<_>>().join(", ");
        assert_eq!(ALLOWED_METHODS, joined);
    }

    #[test]
    fn index_matches_position() {
        for (position, method) in Method::ALL.into_iter().enumerate() {
            assert_eq!(method.index(), position);
        }
    }
}

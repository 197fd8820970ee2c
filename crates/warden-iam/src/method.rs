use serde::{Deserialize, Serialize};

/// HTTP method a permission is bound to. `All` accepts any request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    #[serde(alias = "*")]
    All,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::All => "all",
        }
    }

    /// Map a concrete request method onto the enumeration.
    ///
    /// HEAD is evaluated as GET. Methods outside the enumeration return
    /// `None` and can only be granted by an `All` entry.
    pub fn from_request(method: &str) -> Option<Self> {
        if method.eq_ignore_ascii_case("head") {
            return Some(HttpMethod::Get);
        }
        match method.parse() {
            Ok(HttpMethod::All) | Err(_) => None,
            Ok(other) => Some(other),
        }
    }

    /// Whether an entry bound to `self` governs a request made with `method`.
    pub fn accepts(self, method: &str) -> bool {
        match self {
            HttpMethod::All => true,
            bound => HttpMethod::from_request(method) == Some(bound),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = crate::IamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "all" | "*" => Ok(HttpMethod::All),
            _ => Err(crate::IamError::InvalidMethod(value.to_string())),
        }
    }
}

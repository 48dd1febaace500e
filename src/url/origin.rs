use crate::UrlError;
use std::fmt;
use url::Url;

/// The same-site boundary of a job: scheme, host and port
///
/// Two URLs share an origin only when all three components are equal. A
/// string prefix test is not enough: `https://example.com` is a prefix of
/// `https://example.com.evil.net/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    /// Extracts the origin of a URL
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use sumi_press::url::Origin;
    ///
    /// let origin = Origin::of(&Url::parse("https://Example.com:8443/a/b").unwrap()).unwrap();
    /// assert_eq!(origin.to_string(), "https://example.com:8443");
    /// ```
    pub fn of(url: &Url) -> Result<Self, UrlError> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(UrlError::MissingHost)?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_lowercase(),
            port: url.port_or_known_default(),
        })
    }

    /// Returns true if `url` has exactly this scheme, host and port
    pub fn contains(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
            && url
                .host_str()
                .is_some_and(|h| h.eq_ignore_ascii_case(&self.host))
            && url.port_or_known_default() == self.port
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default_port = match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        };

        match self.port {
            Some(port) if Some(port) != default_port => {
                write!(f, "{}://{}:{}", self.scheme, self.host, port)
            }
            _ => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

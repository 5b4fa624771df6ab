//! Proxy list files: one endpoint per line, scheme optional.

use crate::error::{LoadError, ProxyParseError};
use crate::{ProxyDescriptor, ProxyScheme};
use log::{info, warn};
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

impl FromStr for ProxyDescriptor {
    type Err = ProxyParseError;

    /// `host:port` defaults to http. `socks5://host:port` and friends keep
    /// their scheme. Prefix matching ignores case.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();

        let (scheme, address) = match line.find("://") {
            Some(idx) => {
                let prefix = &line[..idx];
                let scheme = ProxyScheme::ALL
                    .into_iter()
                    .find(|s| s.as_str().eq_ignore_ascii_case(prefix))
                    .ok_or_else(|| ProxyParseError::UnsupportedScheme(prefix.to_string()))?;
                (scheme, &line[idx + 3..])
            }
            None => (ProxyScheme::Http, line),
        };

        let address = address.trim_end_matches('/');
        if address.is_empty() {
            return Err(ProxyParseError::EmptyAddress);
        }

        Ok(ProxyDescriptor::new(scheme, address))
    }
}

/// Parse a whole proxy list. Blank lines and `#` comments are skipped, bad
/// lines are logged and skipped.
pub fn parse_proxy_list(content: &str) -> Vec<ProxyDescriptor> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match line.parse() {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    warn!("Skipping proxy on line {}: {}", idx + 1, e);
                    None
                }
            }
        })
        .collect()
}

pub fn load_proxies(path: impl AsRef<Path>) -> Result<Vec<ProxyDescriptor>, LoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let proxies = parse_proxy_list(&content);
    info!("📂 Loaded {} proxies from {}", proxies.len(), path.display());
    Ok(proxies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_defaults_to_http() {
        let proxy: ProxyDescriptor = "1.2.3.4:8080".parse().unwrap();
        assert_eq!(proxy, ProxyDescriptor::new(ProxyScheme::Http, "1.2.3.4:8080"));
        assert_eq!(proxy.url(), "http://1.2.3.4:8080");
    }

    #[test]
    fn explicit_schemes_are_kept() {
        for (line, scheme) in [
            ("http://a:1", ProxyScheme::Http),
            ("https://a:1", ProxyScheme::Https),
            ("socks4://a:1", ProxyScheme::Socks4),
            ("SOCKS5://a:1", ProxyScheme::Socks5),
        ] {
            let proxy: ProxyDescriptor = line.parse().unwrap();
            assert_eq!(proxy.scheme, scheme, "{}", line);
            assert_eq!(proxy.address, "a:1");
        }
    }

    #[test]
    fn credentials_stay_in_the_address() {
        let proxy: ProxyDescriptor = "socks5://user:pw@10.0.0.2:1080".parse().unwrap();
        assert_eq!(proxy.address, "user:pw@10.0.0.2:1080");
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = "ftp://a:21".parse::<ProxyDescriptor>().unwrap_err();
        assert_eq!(err, ProxyParseError::UnsupportedScheme("ftp".to_string()));
        assert_eq!("socks5://".parse::<ProxyDescriptor>().unwrap_err(), ProxyParseError::EmptyAddress);
    }

    #[test]
    fn list_skips_blanks_comments_and_garbage() {
        let content = "\n  1.1.1.1:80  \n# comment\n\nftp://x:1\nsocks5://2.2.2.2:1080\n";
        let proxies = parse_proxy_list(content);
        assert_eq!(
            proxies,
            vec![
                ProxyDescriptor::new(ProxyScheme::Http, "1.1.1.1:80"),
                ProxyDescriptor::new(ProxyScheme::Socks5, "2.2.2.2:1080"),
            ]
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_proxies("/definitely/not/here/proxies.txt").unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }
}

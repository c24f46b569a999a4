//! Profile URL validation and username extraction

use url::Url;

use crate::error::{Error, Result};

const PROFILE_HOST: &str = "www.reddit.com";

/// Extract the username from `https://www.reddit.com/user/<name>[/]`.
///
/// The name is returned case-preserved. Any other shape fails with
/// [`Error::InvalidUrl`].
pub fn parse_profile_url(input: &str) -> Result<String> {
    let url = Url::parse(input.trim())
        .map_err(|e| Error::invalid_url(input, format!("not a valid URL ({})", e)))?;

    if url.scheme() != "https" {
        return Err(Error::invalid_url(input, "scheme must be https"));
    }
    if url.host_str() != Some(PROFILE_HOST) || url.port().is_some() {
        return Err(Error::invalid_url(
            input,
            format!("host must be {}", PROFILE_HOST),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::invalid_url(
            input,
            "query strings and fragments are not allowed",
        ));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    let name = match segments.as_slice() {
        ["user", name] | ["user", name, ""] => *name,
        _ => {
            return Err(Error::invalid_url(
                input,
                "expected a /user/<username>/ profile path",
            ))
        }
    };

    validate_username(input, name)?;
    Ok(name.to_string())
}

fn validate_username(input: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_url(input, "username is empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::invalid_url(
            input,
            format!("username '{}' may only contain letters, digits, '-' and '_'", name),
        ));
    }
    Ok(())
}

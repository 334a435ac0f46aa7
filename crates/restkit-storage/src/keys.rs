//! Object key paths and delivery URLs.

use chrono::{DateTime, Utc};
use restkit_common::datetime_to_utc_unix;

/// Directory used when callers do not name one.
pub const DEFAULT_DIRECTORY: &str = "default";

/// Public delivery host.
pub const DEFAULT_DELIVERY_BASE_URL: &str = "https://res.cloudinary.com";

/// Storage key for `key` under `directory` (`"{directory}/{key}"`).
#[must_use]
pub fn object_key(directory: Option<&str>, key: &str) -> String {
    let directory = directory
        .map(|directory| directory.trim_matches('/'))
        .filter(|directory| !directory.is_empty())
        .unwrap_or(DEFAULT_DIRECTORY);
    format!("{directory}/{key}")
}

/// Builds delivery URLs for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    base_url: String,
    cloud_name: String,
}

impl Delivery {
    /// Delivery URLs served from the public host.
    #[must_use]
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_DELIVERY_BASE_URL, cloud_name)
    }

    /// Delivery URLs served from `base_url` (a CDN alias or test server).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, cloud_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cloud_name: cloud_name.into(),
        }
    }

    /// URL for `public_id` at `version`.
    ///
    /// A missing or zero version falls back to `now` in Unix seconds. When both
    /// `width` and `height` are non-zero the image is fill-cropped to that
    /// size; otherwise no transformation is applied.
    #[must_use]
    pub fn download_url(
        &self,
        public_id: &str,
        version: Option<i64>,
        width: Option<u32>,
        height: Option<u32>,
        now: DateTime<Utc>,
    ) -> String {
        let version = version
            .filter(|version| *version != 0)
            .unwrap_or_else(|| datetime_to_utc_unix(Some(&now)));
        let transformation = match (width.filter(|w| *w > 0), height.filter(|h| *h > 0)) {
            (Some(width), Some(height)) => format!("c_fill,h_{height},w_{width}/"),
            _ => String::new(),
        };
        format!(
            "{}/{}/image/upload/{transformation}v{version}/{public_id}",
            self.base_url, self.cloud_name
        )
    }
}

/// Shorthand for [`Delivery::download_url`] on the public host.
#[must_use]
pub fn download_url(
    cloud_name: &str,
    public_id: &str,
    version: Option<i64>,
    width: Option<u32>,
    height: Option<u32>,
    now: DateTime<Utc>,
) -> String {
    Delivery::new(cloud_name).download_url(public_id, version, width, height, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> anyhow::Result<DateTime<Utc>> {
        DateTime::from_timestamp(1_717_171_717, 0).ok_or_else(|| anyhow::anyhow!("out of range"))
    }

    #[test]
    fn object_key_defaults_the_directory() {
        assert_eq!(object_key(None, "42"), "default/42");
        assert_eq!(object_key(Some(""), "42"), "default/42");
        assert_eq!(object_key(Some("avatars/"), "42"), "avatars/42");
    }

    #[test]
    fn missing_version_uses_the_supplied_clock() -> anyhow::Result<()> {
        let url = download_url("demo", "avatars/42", None, None, None, now()?);
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/v1717171717/avatars/42"
        );
        let zero = download_url("demo", "avatars/42", Some(0), None, None, now()?);
        assert_eq!(zero, url);
        Ok(())
    }

    #[test]
    fn clock_versions_drop_sub_second_precision() -> anyhow::Result<()> {
        let late = DateTime::from_timestamp(1_717_171_717, 999_000_000)
            .ok_or_else(|| anyhow::anyhow!("out of range"))?;
        let url = download_url("demo", "a", None, None, None, late);
        assert!(url.ends_with("/v1717171717/a"));
        Ok(())
    }

    #[test]
    fn explicit_version_is_kept() -> anyhow::Result<()> {
        let url = download_url("demo", "a", Some(5), None, None, now()?);
        assert!(url.ends_with("/v5/a"));
        Ok(())
    }

    #[test]
    fn crop_requires_both_dimensions() -> anyhow::Result<()> {
        let both = download_url("demo", "a", Some(5), Some(200), Some(100), now()?);
        assert_eq!(
            both,
            "https://res.cloudinary.com/demo/image/upload/c_fill,h_100,w_200/v5/a"
        );
        for (width, height) in [(Some(200), None), (None, Some(100)), (Some(0), Some(100))] {
            let url = download_url("demo", "a", Some(5), width, height, now()?);
            assert!(!url.contains("c_fill"), "{url}");
        }
        Ok(())
    }

    #[test]
    fn custom_base_url_is_normalised() -> anyhow::Result<()> {
        let delivery = Delivery::with_base_url("http://127.0.0.1:9000/", "demo");
        assert_eq!(
            delivery.download_url("a", Some(1), None, None, now()?),
            "http://127.0.0.1:9000/demo/image/upload/v1/a"
        );
        Ok(())
    }
}

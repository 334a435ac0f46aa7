//! Media endpoints: delivery URLs and uploads from a remote URL.

use axum::Json;
use axum::http::StatusCode;
use chrono::Utc;
use restkit_errors::ApiException;
use restkit_runtime::BackgroundExecutor;
use restkit_storage::{MediaStorage, object_key};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::dispatch::{
    Endpoint, EndpointRequest, FieldErrors, FieldReader, Validate, Validated,
};
use crate::error::{DefinitionError, HandlerError};

const MAX_KEY_LENGTH: usize = 255;

/// Query of `GET /media/url`.
#[derive(Debug)]
pub(crate) struct MediaUrlQuery {
    public_id: String,
    version: Option<i64>,
    width: Option<u32>,
    height: Option<u32>,
}

impl Validate for MediaUrlQuery {
    fn validate(input: &Value) -> Result<Self, FieldErrors> {
        let mut reader = FieldReader::new(input);
        let public_id = reader.required_str("public_id");
        let public_id = reader.max_length("public_id", public_id, MAX_KEY_LENGTH);
        let version = reader.optional_i64("version");
        let version = reader.min_value("version", version, 0);
        let width = dimension(&mut reader, "width");
        let height = dimension(&mut reader, "height");
        reader.finish(public_id.map(|public_id| Self {
            public_id,
            version,
            width,
            height,
        }))
    }
}

fn dimension(reader: &mut FieldReader<'_>, field: &str) -> Option<u32> {
    let value = reader.optional_i64(field);
    let value = reader.min_value(field, value, 1);
    let value = reader.max_value(field, value, i64::from(u32::MAX));
    value.and_then(|value| u32::try_from(value).ok())
}

/// Body of `POST /media`.
#[derive(Debug)]
pub(crate) struct SavePicture {
    key: String,
    url: String,
    directory: Option<String>,
    wait: bool,
}

impl Validate for SavePicture {
    fn validate(input: &Value) -> Result<Self, FieldErrors> {
        let mut reader = FieldReader::new(input);
        let key = reader.required_str("key");
        let key = reader.max_length("key", key, MAX_KEY_LENGTH);
        let url = reader.required_str("url");
        let url = url.and_then(|url| {
            let valid = Url::parse(&url)
                .is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"));
            if !valid {
                reader.error("url", "Enter a valid URL.");
            }
            valid.then_some(url)
        });
        let directory = reader.optional_str("directory");
        let directory = reader.max_length("directory", directory, MAX_KEY_LENGTH);
        let wait = reader.optional_bool("wait").unwrap_or(false);
        reader.finish(key.zip(url).map(|(key, url)| Self {
            key,
            url,
            directory,
            wait,
        }))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MediaUrlResponse {
    pub(crate) url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SavedMedia {
    pub(crate) public_id: String,
    pub(crate) version: Option<i64>,
    pub(crate) status: &'static str,
}

pub(crate) fn url_endpoint(media: MediaStorage) -> Result<Endpoint, DefinitionError> {
    Endpoint::builder("media_url")
        .default_schema::<MediaUrlQuery>()
        .get(
            move |_request: EndpointRequest, payload: Validated<MediaUrlQuery>| {
                let query = payload.into_inner();
                let url = media.download_url(
                    &query.public_id,
                    query.version,
                    query.width,
                    query.height,
                    Utc::now(),
                );
                async move { Ok::<_, HandlerError>(Json(MediaUrlResponse { url })) }
            },
        )
        .build()
}

pub(crate) fn upload_endpoint(
    media: MediaStorage,
    executor: BackgroundExecutor,
) -> Result<Endpoint, DefinitionError> {
    Endpoint::builder("media_upload")
        .default_schema::<SavePicture>()
        .post(
            move |_request: EndpointRequest, payload: Validated<SavePicture>| {
                let media = media.clone();
                let executor = executor.clone();
                async move { save_picture(media, executor, payload.into_inner()).await }
            },
        )
        .build()
}

async fn save_picture(
    media: MediaStorage,
    executor: BackgroundExecutor,
    request: SavePicture,
) -> Result<(StatusCode, Json<SavedMedia>), HandlerError> {
    let public_id = object_key(request.directory.as_deref(), &request.key);
    let should_async = !request.wait;
    let work = async move {
        media
            .save_picture_url_for_object(&request.key, &request.url, request.directory.as_deref())
            .await
            .map_err(anyhow::Error::from)
    };
    let stored = executor
        .run("save_picture_url", should_async, work)
        .await
        .map_err(|error| HandlerError::from(error.context(ApiException::upstream_http())))?;
    Ok(match stored {
        Some(stored) => (
            StatusCode::CREATED,
            Json(SavedMedia {
                public_id: stored.public_id,
                version: Some(stored.version),
                status: "stored",
            }),
        ),
        None => (
            StatusCode::ACCEPTED,
            Json(SavedMedia {
                public_id,
                version: None,
                status: "accepted",
            }),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_query_coerces_query_strings() -> Result<(), FieldErrors> {
        let query = MediaUrlQuery::validate(&json!({
            "public_id": "avatars/1",
            "width": "10",
            "height": "20",
        }))?;
        assert_eq!(query.public_id, "avatars/1");
        assert_eq!(query.version, None);
        assert_eq!((query.width, query.height), (Some(10), Some(20)));
        Ok(())
    }

    #[test]
    fn url_query_rejects_non_positive_dimensions() {
        let Err(errors) = MediaUrlQuery::validate(&json!({"public_id": "a", "width": "0"}))
        else {
            panic!("expected validation failure");
        };
        assert_eq!(
            errors.to_string(),
            "width: Ensure this value is greater than or equal to 1."
        );
    }

    #[test]
    fn save_picture_requires_an_http_url() {
        let Err(errors) = SavePicture::validate(&json!({"key": "42", "url": "ftp://x/y.png"}))
        else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.to_string(), "url: Enter a valid URL.");

        let Err(errors) = SavePicture::validate(&json!({})) else {
            panic!("expected validation failure");
        };
        assert_eq!(
            errors.to_string(),
            "key: This field is required.\nurl: This field is required."
        );
    }

    #[test]
    fn save_picture_defaults_to_background_upload() -> Result<(), FieldErrors> {
        let request = SavePicture::validate(&json!({
            "key": "42",
            "url": "https://example.test/a.png",
            "directory": "avatars",
        }))?;
        assert!(!request.wait);
        assert_eq!(request.directory.as_deref(), Some("avatars"));
        Ok(())
    }
}

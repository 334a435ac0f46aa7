use chrono::Utc;
use restkit_storage::{Delivery, object_key};

use crate::cli::MediaUrlArgs;
use crate::client::{CliError, CliResult};

pub(crate) fn media_url(args: &MediaUrlArgs) -> CliResult<String> {
    if args.key.trim().is_empty() {
        return Err(CliError::validation("media key must not be empty"));
    }
    if args.cloud_name.trim().is_empty() {
        return Err(CliError::validation(
            "cloud name is required (pass --cloud-name or set CLOUDINARY_CLOUD_NAME)",
        ));
    }
    if args.version.is_some_and(|version| version < 0) {
        return Err(CliError::validation("version must not be negative"));
    }
    let public_id = object_key(args.directory.as_deref(), &args.key);
    let delivery = Delivery::with_base_url(args.base_url.as_str(), &args.cloud_name);
    Ok(delivery.download_url(
        &public_id,
        args.version,
        args.width,
        args.height,
        Utc::now(),
    ))
}

pub(crate) fn handle_media_url(args: &MediaUrlArgs) -> CliResult<()> {
    println!("{}", media_url(args)?);
    Ok(())
}

use anyhow::anyhow;
use restkit_errors::ExceptionRegistry;

use crate::cli::{CatalogArgs, CodesArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, classify_envelope};
use crate::output::{Catalog, render_catalog, render_codes, render_tree};

const CATALOG_PATH: &str = "/_meta/exceptions";

fn local_catalog() -> CliResult<Catalog> {
    let registry = ExceptionRegistry::standard()
        .map_err(|err| CliError::failure(anyhow!("built-in exception taxonomy is invalid: {err}")))?;
    Ok(Catalog::from_registry(&registry))
}

pub(crate) fn handle_tree(format: OutputFormat) -> CliResult<()> {
    let catalog = local_catalog()?;
    println!("{}", render_tree(&catalog.tree, format)?);
    Ok(())
}

pub(crate) fn handle_codes(args: &CodesArgs) -> CliResult<()> {
    let catalog = local_catalog()?;
    println!(
        "{}",
        render_codes(&catalog.kinds, args.ambiguous, args.format)?
    );
    Ok(())
}

pub(crate) async fn fetch_catalog(ctx: &AppContext) -> CliResult<Catalog> {
    let url = ctx.endpoint(CATALOG_PATH)?;
    let response = ctx
        .client
        .get(url)
        .send()
        .await
        .map_err(|err| CliError::failure(anyhow!("request to {CATALOG_PATH} failed: {err}")))?;

    if response.status().is_success() {
        response
            .json::<Catalog>()
            .await
            .map_err(|err| CliError::failure(anyhow!("failed to parse exception catalog: {err}")))
    } else {
        Err(classify_envelope(response).await)
    }
}

pub(crate) async fn handle_catalog(ctx: &AppContext, args: &CatalogArgs) -> CliResult<()> {
    let catalog = fetch_catalog(ctx).await?;
    println!("{}", render_catalog(&catalog, args.format)?);
    Ok(())
}

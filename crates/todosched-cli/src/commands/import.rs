use std::path::Path;

use todosched_core::{ImportRequest, Importer};

use super::{print_json, read_input, CmdResult, Context};

/// Parse an import file. `dry_run` forces a dry run regardless of the file.
pub fn load_request(raw: &str, dry_run: bool) -> Result<ImportRequest, serde_json::Error> {
    let mut request: ImportRequest = serde_json::from_str(raw)?;
    if dry_run {
        request.options.get_or_insert_with(Default::default).dry_run = true;
    }
    Ok(request)
}

pub async fn run(ctx: &Context, file: &Path, dry_run: bool) -> CmdResult {
    let raw = read_input(file)?;
    let request = load_request(&raw, dry_run)?;

    let config = ctx.load_config()?;
    let client = ctx.client(&config)?;
    let response = Importer::new(&client, config.default_timezone()?)
        .run(request)
        .await?;

    print_json(&response)
}

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use phyto_diagnosis::{
    DiagnosisEngine, DiagnosisError, DiagnosisRequest, DictionaryHandle, EngineSettings,
    SymptomDictionary,
};
use phyto_vision::OpenAiVisionClient;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::DiagnoseArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `phyto diagnose`.
///
/// Prints the diagnosis, or on failure a JSON report carrying the error
/// source and the gateway's debug info before returning the error.
pub async fn handle(args: &DiagnoseArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let request = build_request(args)?;

    let gateway = OpenAiVisionClient::new(ctx.config.vision.clone())
        .context("failed to build vision client")?;
    let dictionary = SymptomDictionary::load(&ctx.store).await?;
    let engine = DiagnosisEngine::new(
        Arc::clone(&ctx.store),
        Arc::new(DictionaryHandle::new(dictionary)),
        gateway,
        EngineSettings::from_config(&ctx.config),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    match engine.diagnose(&request, &cancel).await {
        Ok(diagnosis) => output(&diagnosis, flags.format),
        Err(e) => {
            output(&failure_report(&e), flags.format)?;
            Err(e.into())
        }
    }
}

fn build_request(args: &DiagnoseArgs) -> anyhow::Result<DiagnosisRequest> {
    let image_base64 = args.image.as_deref().map(encode_image).transpose()?;
    if args.description.trim().is_empty() && image_base64.is_none() && args.image_url.is_none() {
        anyhow::bail!("give a description, --image or --image-url");
    }
    Ok(DiagnosisRequest {
        description: args.description.clone(),
        image_base64,
        image_url: args.image_url.clone(),
        plant_type: args.plant_type.clone(),
        language: args.language.clone(),
    })
}

/// Read an image file as a base64 `data:` URL.
fn encode_image(path: &Path) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

fn failure_report(error: &DiagnosisError) -> serde_json::Value {
    json!({
        "status": "failed",
        "error": error.to_string(),
        "error_source": error.error_source(),
        "debug_info": error.debug_info(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use phyto_vision::{ErrorSource, VisionDebugInfo};
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(description: &str) -> DiagnoseArgs {
        DiagnoseArgs {
            description: description.to_string(),
            image: None,
            image_url: None,
            plant_type: None,
            language: None,
        }
    }

    #[test]
    fn image_is_base64_data_url() {
        let mut file = tempfile::Builder::new().suffix(".PNG").tempfile().unwrap();
        file.write_all(b"ABC").unwrap();

        let encoded = encode_image(file.path()).unwrap();
        assert_eq!(encoded, "data:image/png;base64,QUJD");
    }

    #[test]
    fn empty_request_is_rejected() {
        assert!(build_request(&args("   ")).is_err());
        let request = build_request(&args("white spots")).unwrap();
        assert_eq!(request.description, "white spots");
        assert!(request.image_base64.is_none());
    }

    #[test]
    fn missing_image_file_is_an_error() {
        let mut a = args("");
        a.image = Some("/definitely/not/here.jpg".into());
        assert!(build_request(&a).is_err());
    }

    #[test]
    fn failure_report_carries_source_tag() {
        let error = DiagnosisError::GatewayUnavailable {
            debug: VisionDebugInfo::default().with_error("not_configured", "no key", ErrorSource::App),
        };
        let report = failure_report(&error);
        assert_eq!(report["error_source"], "App");
        assert_eq!(report["debug_info"]["error_source"], "App");
        assert_eq!(report["debug_info"]["error_code"], "not_configured");
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{info, info_span};

use crate::artifacts::{self, CLOUD_CONFIG_FILE, GeneratedFile, OPS_FILE, TEMPLATE_FILE};
use crate::cloudconfig::{CloudConfigGenerator, CloudConfigInput, OpsGenerator, ops};
use crate::config::{BblCommand, BblConfig};
use crate::error::{BblError, Result};
use crate::telemetry;
use crate::template::builders::nat::nat_ami;
use crate::template::{AwsTemplateBuilder, TemplateBuilder};

pub async fn run(config: BblConfig) -> Result<()> {
    telemetry::init(config.log_level.as_deref())?;

    let span = info_span!("bbl", command = config.command.as_str());
    let _enter = span.enter();

    let file = render(&config.command)?;
    match &config.out_dir {
        Some(dir) => {
            let written = artifacts::write_artifacts(dir, std::slice::from_ref(&file))?;
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
        None => print!("{}", file.contents),
    }
    Ok(())
}

/// Produces the document a command generates without writing it anywhere.
pub fn render(command: &BblCommand) -> Result<GeneratedFile> {
    match command {
        BblCommand::Template { params, aws_region } => {
            if let Some(region) = aws_region
                && nat_ami(region).is_none()
            {
                return Err(BblError::Config(format!(
                    "no NAT image is published for region {region}"
                )));
            }
            let template = AwsTemplateBuilder::new().build(params)?;
            info!(resources = template.resources.len(), "built template");
            let mut json = template.to_json_pretty()?;
            json.push('\n');
            Ok(GeneratedFile::new(TEMPLATE_FILE, json))
        }
        BblCommand::CloudConfig {
            input,
            static_pool_size,
        } => {
            let input: CloudConfigInput = serde_yaml_bw::from_str(&read(input)?)?;
            let config = CloudConfigGenerator::new()
                .with_static_pool_size(*static_pool_size)
                .generate(&input)?;
            Ok(GeneratedFile::new(CLOUD_CONFIG_FILE, config.to_yaml()?))
        }
        BblCommand::OpsFile {
            stack_outputs,
            static_pool_size,
        } => {
            let outputs: BTreeMap<String, String> = serde_json::from_str(&read(stack_outputs)?)?;
            let ops = OpsGenerator::new()
                .with_static_pool_size(*static_pool_size)
                .generate(&outputs)?;
            info!(ops = ops.len(), "built ops-file");
            Ok(GeneratedFile::new(OPS_FILE, ops::to_yaml(&ops)?))
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| {
        BblError::Config(format!("failed to read {}: {err}", path.display()))
    })
}

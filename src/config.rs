use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::cloudconfig::networks::DEFAULT_STATIC_POOL_SIZE;
use crate::error::{BblError, Result};
use crate::template::builders::{LoadBalancerKind, TemplateParams};

/// Load balancer selection on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LbTypeArg {
    #[default]
    None,
    Concourse,
    Cf,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Environment identifier (defaults to $BBL_ENV_ID).
    #[arg(long)]
    pub env_id: Option<String>,

    /// Availability zone to lay subnets into; repeat for each zone.
    #[arg(long = "az", required = true)]
    pub azs: Vec<String>,

    /// Load balancers to provision (none|concourse|cf).
    #[arg(long, value_enum, default_value = "none")]
    pub lb_type: LbTypeArg,

    /// ARN of the certificate served by the load balancers.
    #[arg(long)]
    pub lb_cert_arn: Option<String>,

    /// Add the isolation-segment router (requires --lb-type cf).
    #[arg(long, default_value_t = false)]
    pub iso_segment: bool,

    /// SSH key pair name (defaults to keypair-<env-id>).
    #[arg(long)]
    pub key_pair_name: Option<String>,

    /// IAM user name (defaults to bosh-iam-user-<env-id>).
    #[arg(long)]
    pub iam_user_name: Option<String>,

    /// Region the template targets (defaults to $BBL_AWS_REGION).
    #[arg(long)]
    pub aws_region: Option<String>,

    /// Write template.json here instead of printing it (defaults to $BBL_OUTPUT_DIR).
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CloudConfigArgs {
    /// YAML or JSON file holding zones, subnets and load balancers.
    #[arg(long)]
    pub input: PathBuf,

    /// Addresses in each subnet's static pool (defaults to $BBL_STATIC_POOL_SIZE or 65).
    #[arg(long)]
    pub static_pool_size: Option<u32>,

    /// Write cloud-config.yml here instead of printing it (defaults to $BBL_OUTPUT_DIR).
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct OpsFileArgs {
    /// JSON object mapping stack output keys to values.
    #[arg(long)]
    pub stack_outputs: PathBuf,

    /// Addresses in each subnet's static pool (defaults to $BBL_STATIC_POOL_SIZE or 65).
    #[arg(long)]
    pub static_pool_size: Option<u32>,

    /// Write ops-file.yml here instead of printing it (defaults to $BBL_OUTPUT_DIR).
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

/// Top-level CLI structure.
#[derive(Debug, Parser)]
#[command(
    name = "bbl",
    version,
    about = "Generates the AWS infrastructure template and BOSH cloud-config for a director environment."
)]
pub struct CliArgs {
    /// Log filter, e.g. `debug` or `bosh_bootloader=trace` (defaults to $RUST_LOG or info).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the composite CloudFormation template.
    Template(TemplateArgs),
    /// Print the cloud-config for a described network layout.
    CloudConfig(CloudConfigArgs),
    /// Print the ops-file deriving the cloud-config from stack outputs.
    OpsFile(OpsFileArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BblCommand {
    Template {
        params: TemplateParams,
        aws_region: Option<String>,
    },
    CloudConfig {
        input: PathBuf,
        static_pool_size: u32,
    },
    OpsFile {
        stack_outputs: PathBuf,
        static_pool_size: u32,
    },
}

impl BblCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            BblCommand::Template { .. } => "template",
            BblCommand::CloudConfig { .. } => "cloud-config",
            BblCommand::OpsFile { .. } => "ops-file",
        }
    }
}

/// Complete configuration of one `bbl` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BblConfig {
    pub command: BblCommand,
    pub out_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl BblConfig {
    pub fn from_env_and_args(cli: CliArgs) -> Result<Self> {
        Self::from_args_with_env(cli, |key| env::var(key).ok())
    }

    pub fn from_args_with_env<F>(cli: CliArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let out_dir = |flag: Option<PathBuf>| flag.or_else(|| lookup("BBL_OUTPUT_DIR").map(PathBuf::from));
        let pool_size = |flag: Option<u32>| static_pool_size(flag, lookup("BBL_STATIC_POOL_SIZE"));

        let (command, out) = match cli.command {
            Command::Template(args) => {
                let out = out_dir(args.out_dir.clone());
                let aws_region = args.aws_region.clone().or_else(|| lookup("BBL_AWS_REGION"));
                let env_id = args
                    .env_id
                    .clone()
                    .or_else(|| lookup("BBL_ENV_ID"))
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        BblError::Config("--env-id (or BBL_ENV_ID) is required".to_string())
                    })?;
                let params = template_params(env_id, args)?;
                (BblCommand::Template { params, aws_region }, out)
            }
            Command::CloudConfig(args) => (
                BblCommand::CloudConfig {
                    input: args.input,
                    static_pool_size: pool_size(args.static_pool_size)?,
                },
                out_dir(args.out_dir),
            ),
            Command::OpsFile(args) => (
                BblCommand::OpsFile {
                    stack_outputs: args.stack_outputs,
                    static_pool_size: pool_size(args.static_pool_size)?,
                },
                out_dir(args.out_dir),
            ),
        };

        Ok(Self {
            command,
            out_dir: out,
            log_level: cli.log_level,
        })
    }
}

fn template_params(env_id: String, args: TemplateArgs) -> Result<TemplateParams> {
    let load_balancer = match (args.lb_type, args.iso_segment) {
        (LbTypeArg::Cf, iso_segment) => LoadBalancerKind::Cf { iso_segment },
        (_, true) => {
            return Err(BblError::Config(
                "--iso-segment requires --lb-type cf".to_string(),
            ));
        }
        (LbTypeArg::Concourse, false) => LoadBalancerKind::Concourse,
        (LbTypeArg::None, false) => LoadBalancerKind::None,
    };

    Ok(TemplateParams {
        key_pair_name: args
            .key_pair_name
            .unwrap_or_else(|| format!("keypair-{env_id}")),
        iam_user_name: args
            .iam_user_name
            .unwrap_or_else(|| format!("bosh-iam-user-{env_id}")),
        availability_zones: args.azs,
        load_balancer,
        load_balancer_certificate_arn: args.lb_cert_arn,
        env_id,
    })
}

fn static_pool_size(flag: Option<u32>, env_value: Option<String>) -> Result<u32> {
    match (flag, env_value) {
        (Some(0), _) => Err(BblError::Config(
            "--static-pool-size must be a positive integer, got '0'".to_string(),
        )),
        (Some(size), _) => Ok(size),
        (None, Some(raw)) => raw
            .trim()
            .parse()
            .ok()
            .filter(|size: &u32| *size > 0)
            .ok_or_else(|| {
                BblError::Config(format!(
                    "BBL_STATIC_POOL_SIZE must be a positive integer, got '{raw}'"
                ))
            }),
        (None, None) => Ok(DEFAULT_STATIC_POOL_SIZE),
    }
}

#![forbid(unsafe_code)]

pub mod apply;
pub mod artifacts;
pub mod cloudconfig;
pub mod config;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod network;
pub mod stack;
pub mod telemetry;
pub mod template;

pub use cloudconfig::{CloudConfig, CloudConfigGenerator, NetworksGenerator, OpsGenerator};
pub use config::{BblCommand, BblConfig, CliArgs, Command};
pub use error::{BblError, Result};
pub use events::{EventSink, RecordingEventSink, TracingEventSink};
pub use infrastructure::InfrastructureManager;
pub use network::{CidrBlock, Ip, IpFamily};
pub use stack::{Stack, StackManager, StackStatus, StackTransport};
pub use template::{AwsTemplateBuilder, Template, TemplateBuilder, TemplateParams};

// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Maps flags onto connection arguments and a desired-state request.

use clap::{ArgAction, Parser, ValueEnum};
use one_image::config::ConnectionArgs;
use one_image::manage::{DesiredState, ManageError, Request, Selector};
use one_image::output::OutputMode;
use one_image::types::{ImageId, ImageName};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "one-image")]
#[command(about = "Manage OpenNebula images with idempotent desired-state semantics")]
#[command(version)]
pub struct Cli {
    /// URL of the OpenNebula RPC server (falls back to ONE_URL)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// User to log in as (falls back to ONE_USERNAME)
    #[arg(long, value_name = "USER")]
    pub api_username: Option<String>,

    /// Password of the user (falls back to ONE_PASSWORD)
    #[arg(long, value_name = "PASSWORD")]
    pub api_password: Option<String>,

    /// Id of the image to manage
    #[arg(long, conflicts_with = "name")]
    pub id: Option<u32>,

    /// Name of the image to manage
    #[arg(long)]
    pub name: Option<String>,

    /// Desired state of the image
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,

    /// Whether the image should be enabled or disabled
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub enabled: Option<bool>,

    /// Name for the clone or the renamed image
    #[arg(long, value_name = "NAME")]
    pub new_name: Option<String>,

    /// Validate and report without changing anything
    #[arg(long, visible_alias = "dry-run")]
    pub check: bool,

    /// YAML file with connection defaults and wait policy
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Result format
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Present,
    Absent,
    Cloned,
    Renamed,
}

impl From<StateArg> for DesiredState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => DesiredState::Present,
            StateArg::Absent => DesiredState::Absent,
            StateArg::Cloned => DesiredState::Cloned,
            StateArg::Renamed => DesiredState::Renamed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Text,
}

impl From<FormatArg> for OutputMode {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => OutputMode::Json,
            FormatArg::Text => OutputMode::Text,
        }
    }
}

impl Cli {
    pub fn connection_args(&self) -> ConnectionArgs {
        ConnectionArgs {
            url: self.api_url.clone(),
            username: self.api_username.clone(),
            password: self.api_password.clone(),
        }
    }

    pub fn request(&self) -> Result<Request, ManageError> {
        let selector = Selector::from_parts(self.id.map(ImageId::new), self.name.clone())?;
        let new_name = self
            .new_name
            .clone()
            .map(ImageName::new)
            .transpose()
            .map_err(|source| ManageError::InvalidName { source })?;

        Ok(Request {
            selector,
            state: self.state.into(),
            enabled: self.enabled,
            new_name,
        })
    }
}

use clap::{Args, Parser, Subcommand};

pub mod error;
pub mod handler;
pub mod output;

/// obsctl - command-line access to the observability platform API
#[derive(Parser, Debug)]
#[command(name = "obsctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Override config directory path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<std::path::PathBuf>,

    /// Access profile to use instead of the configured current one
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Log the curl equivalent of every request sent to the platform
    #[arg(long, global = true)]
    pub curl: bool,

    /// Do not show a progress spinner while calls are in flight
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose logging (TRACE level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every API call command
#[derive(Args, Debug, Default, Clone)]
pub struct CallArgs {
    /// Extra request header, repeatable (NAME=VALUE)
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE")]
    pub headers: Vec<String>,

    /// Status code that is an expected outcome rather than an error, repeatable
    #[arg(long = "expect", value_name = "STATUS")]
    pub expected: Vec<u16>,

    /// Save a file/archive response under this name
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Give up if the call has not completed within this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Request payload options
#[derive(Args, Debug, Default, Clone)]
pub struct BodyArgs {
    /// Inline request body
    #[arg(short, long, conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Read the request body from a file
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<std::path::PathBuf>,

    /// Send the body as-is with this content type instead of as JSON
    #[arg(long, value_name = "MIME")]
    pub content_type: Option<String>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET a platform resource
    Get {
        /// Path relative to the profile URL, optionally with a query
        path: String,

        /// Accept header for non-JSON responses
        #[arg(long, value_name = "MIME")]
        accept: Option<String>,

        #[command(flatten)]
        call: CallArgs,
    },

    /// DELETE a platform resource
    Delete {
        path: String,

        #[command(flatten)]
        call: CallArgs,
    },

    /// POST to a platform resource
    Post {
        path: String,

        #[command(flatten)]
        body: BodyArgs,

        #[command(flatten)]
        call: CallArgs,
    },

    /// PUT a platform resource
    Put {
        path: String,

        #[command(flatten)]
        body: BodyArgs,

        #[command(flatten)]
        call: CallArgs,
    },

    /// PATCH a platform resource with a JSON merge-patch
    Patch {
        path: String,

        #[command(flatten)]
        body: BodyArgs,

        #[command(flatten)]
        call: CallArgs,
    },

    /// Call a platform resource with an arbitrary method
    Request {
        /// HTTP method (GET, POST, ...)
        method: String,

        path: String,

        #[command(flatten)]
        body: BodyArgs,

        #[command(flatten)]
        call: CallArgs,
    },

    /// Log in with the profile's auth method and store the token
    Login,
}

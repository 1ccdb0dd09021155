//! Issue a portal access token for local development.

use clap::{Parser, ValueEnum};
use uuid::Uuid;

use school_portal_server::auth::{generate_access_token, get_access_token_expiry, Role};

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Teacher,
    Student,
    Guardian,
    Staff,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Teacher => Role::Teacher,
            RoleArg::Student => Role::Student,
            RoleArg::Guardian => Role::Guardian,
            RoleArg::Staff => Role::Staff,
        }
    }
}

#[derive(Parser)]
#[command(name = "issue-token")]
#[command(about = "Issue a bearer token signed with JWT_SECRET", long_about = None)]
struct Args {
    /// Portal role carried in the token
    #[arg(short, long, value_enum, default_value = "teacher")]
    role: RoleArg,

    #[arg(short, long, default_value = "dev")]
    username: String,

    /// User id; a fresh one is generated when omitted
    #[arg(long)]
    user_id: Option<Uuid>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);
    let token = generate_access_token(&user_id.to_string(), &args.username, args.role.into())?;

    eprintln!(
        "user_id={} expires_in={}s",
        user_id,
        get_access_token_expiry()
    );
    println!("{token}");
    Ok(())
}

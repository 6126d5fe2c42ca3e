use anyhow::Result;
use git_reviewers::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}

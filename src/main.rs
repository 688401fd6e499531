use std::process::ExitCode;

use clap::Parser;
use commit_gen::{
   api::ProviderClient,
   app,
   config::AppConfig,
   editor::ExternalEditor,
   error::Result,
   git::GitRepository,
   interaction::{SessionOutcome, StdConsole},
   interrupt,
   style,
   types::Args,
};

/// Apply CLI overrides to config
fn apply_cli_overrides(config: &mut AppConfig, args: &Args) {
   if let Some(ref model) = args.model {
      config.provider.model.clone_from(model);
   }
   if args.no_desc {
      config.description_enabled = false;
   }
}

fn run(args: &Args) -> Result<SessionOutcome> {
   let mut config = AppConfig::load(args.config.as_deref())?;
   apply_cli_overrides(&mut config, args);

   if style::verbose()
      && let Some(ref source) = config.source
   {
      eprintln!("{}", style::dim(&format!("config: {}", source.display())));
   }

   interrupt::install()?;

   let repo = GitRepository::new(args.dir.clone());
   let generator = ProviderClient::new(config.provider.clone())?;
   let editor = ExternalEditor::from_config(config.editor.as_deref());
   let mut console = StdConsole;

   app::run(args, &config, &repo, &generator, &mut console, &editor)
}

fn main() -> ExitCode {
   dotenvy::dotenv().ok();
   let args = Args::parse();

   if args.list {
      print!("{}", app::list_styles());
      return ExitCode::SUCCESS;
   }

   match run(&args) {
      Ok(_) => ExitCode::SUCCESS,
      Err(e) => {
         style::print_error(&e.to_string());
         ExitCode::FAILURE
      },
   }
}

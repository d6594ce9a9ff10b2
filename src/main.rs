use clap::Parser;
use fins_builder::utils::error::{BuildError, ErrorSeverity};
use fins_builder::utils::{logger, validation::Validate};
use fins_builder::{BuildConfig, BuildEngine, CliConfig, LocalSink};

fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Loading build file {}", args.config);
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    let config = match BuildConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load build file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        fail(&e);
    }
    tracing::info!("Build file '{}' validated", config.build.name);

    let context = match config.build_context(args.simulation) {
        Ok(context) => context,
        Err(e) => fail(&e),
    };
    if !context.simulation_enabled() {
        tracing::info!("Simulation substitution disabled");
    }

    let engine = BuildEngine::new(context, LocalSink::new(args.output.clone()));
    tracing::info!(
        "Declared {} FINS port(s) on {} lower port(s)",
        engine.context().ports().len(),
        engine.context().lower_ports().len()
    );

    if args.dry_run {
        tracing::info!("DRY RUN - nothing will be written");
        let artifacts = match engine.generate() {
            Ok(artifacts) => artifacts,
            Err(e) => fail(&e),
        };
        print!("{}", artifacts.startup_script);
        return Ok(());
    }

    match engine.run(&config) {
        Ok(written) => {
            println!("✅ Generated {} file(s) in {}", written.len(), args.output);
            for path in written {
                println!("📁 {}", path);
            }
        }
        Err(e) => fail(&e),
    }

    Ok(())
}

fn fail(e: &BuildError) -> ! {
    tracing::error!(
        "Build failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

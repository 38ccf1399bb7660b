use offsetgen::pipeline::publish::{GitHubPublisher, PublishOutcome, Publisher};
use offsetgen::pipeline::{self, dump};
use offsetgen::{Config, Error};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    println!("Offset Generator\n");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n❌ {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::load()?;

    println!("🟪 Phase 0: Running {}...", config.dumper_path);
    println!("   • Recreating {}", config.output_dir.display());
    dump::prepare_output_dir(&config.output_dir)?;

    let dumper = config.dumper();
    let stdout = dump::run_dumper(&dumper, &config.output_dir)?;
    println!("   ✓ Dumper finished ({} bytes of output)", stdout.len());
    dump::settle(&dumper).await;

    println!("\n🟩 Phase 1-4: Parsing headers and generating files...");
    let result = pipeline::generate(&config)?;
    println!("   • Header files parsed: {}", result.files_parsed);
    println!("   • Namespaces: {}", result.namespaces);
    println!("   • Offsets: {}", result.offsets);
    if result.overrides > 0 {
        println!("   • Overridden by later files: {}", result.overrides);
    }
    println!("   ✓ {}", result.json_file.display());
    println!("   ✓ {}", result.type_stub_file.display());
    println!("   ✓ {}", result.assignment_stub_file.display());

    println!("\n🟥 Phase 5: Publishing {}...", result.json_file.display());
    let publisher = GitHubPublisher::new(config.publish.clone());
    match publisher.publish(&result.json_file).await {
        PublishOutcome::Created => println!("   ✓ Created in {}", config.publish.repository),
        PublishOutcome::Updated => println!("   ✓ Updated in {}", config.publish.repository),
        PublishOutcome::Skipped(reason) => println!("   • Skipped: {}", reason),
        PublishOutcome::Failed(e) => {
            eprintln!("\n⚠️  Warning: Could not publish: {}", e);
            eprintln!("   Generated files are still available locally");
        }
    }

    println!("\n🎉 All done!");
    Ok(())
}

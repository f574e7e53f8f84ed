use gantt_planner::cli::{exit_code, run, EXIT_INTERNAL};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    // Colors degrade to plain text when the console refuses ANSI
    let _ = enable_ansi_support::enable_ansi_support();

    let Err(err) = run() else {
        return;
    };
    let code = exit_code(&err);
    if code == EXIT_INTERNAL {
        eprintln!("Internal error: {}", err);
        let causes: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
        if !causes.is_empty() {
            eprintln!("\nCaused by:");
            for (depth, cause) in causes.iter().enumerate() {
                eprintln!("{:width$}  {}", "", cause, width = depth + 1);
            }
        }
    } else {
        eprintln!("Error: {:#}", err);
    }
    std::process::exit(code);
}

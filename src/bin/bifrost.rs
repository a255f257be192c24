//! bifrost: one-shot prompt client
//!
//! Sends a single prompt through the adapter and prints the reply.

use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use futures_util::StreamExt;

use bifrost::generator::vendor_search_tool;
use bifrost::{
    Content, ContentGenerator, GenerationConfig, GenerationRequest, GenerationResponse, Part,
    Settings, StreamEvent, UsageMetadata,
};

/// Bifrost CLI
#[derive(Parser)]
#[command(name = "bifrost")]
#[command(version = bifrost::PKG_VERSION)]
#[command(about = "Send a prompt to a GLM endpoint through the Gemini-contract adapter")]
struct Args {
    /// Settings file (default: ~/.bifrost/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to use (overrides settings)
    #[arg(short, long)]
    model: Option<String>,

    /// Endpoint base URL or full chat-completions URL (overrides settings)
    #[arg(long, env = "BIFROST_ENDPOINT")]
    endpoint: Option<String>,

    /// System instruction
    #[arg(short, long)]
    system: Option<String>,

    /// Do not request reasoning
    #[arg(long)]
    no_thinking: bool,

    /// Keep reasoning from prior turns instead of clearing it
    #[arg(long)]
    keep_thinking: bool,

    /// Offer the search tool when the active auth mode routes it to the vendor
    #[arg(long)]
    web_search: bool,

    /// Stream the reply as it is generated
    #[arg(long)]
    stream: bool,

    /// Prompt text (or omit to read from stdin)
    prompt: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    tracing::debug!(version = %bifrost::version::version_string(), "starting");
    let settings = Settings::load(args.config.as_deref())?;

    let mut builder = settings.adapter_config();
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if let Some(endpoint) = &args.endpoint {
        builder = builder.endpoint(endpoint);
    }
    if args.no_thinking {
        builder = builder.disable_thinking(true);
    }
    if args.keep_thinking {
        builder = builder.clear_thinking(false);
    }
    let generator = builder.build()?;

    let prompt = resolve_text(args.prompt)?;
    let mut config = GenerationConfig::default();
    if let Some(system) = args.system {
        config = config.system_instruction(system);
    }
    if args.web_search {
        match vendor_search_tool(settings.auth_mode()) {
            Some(tool) => config = config.tool(tool),
            None => eprintln!(
                "note: auth mode '{}' uses the host search integration; --web-search ignored",
                settings.auth_mode().as_str()
            ),
        }
    }

    let request = GenerationRequest::new(
        args.model.unwrap_or_default(),
        vec![Content::user(prompt)],
    )
    .config(config);
    let request_id = format!("bifrost-cli-{}", std::process::id());

    if args.stream {
        let mut stream = generator.generate_stream(&request, &request_id).await?;
        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Delta(delta) => print_parts(delta.parts())?,
                StreamEvent::Finished {
                    finish_reason,
                    usage_metadata,
                    ..
                } => {
                    println!();
                    eprintln!("finish: {finish_reason:?}");
                    if let Some(usage) = usage_metadata {
                        print_usage(&usage);
                    }
                }
            }
        }
    } else {
        let response = generator.generate(&request, &request_id).await?;
        print_response(&response)?;
    }

    Ok(())
}

fn print_response(response: &GenerationResponse) -> io::Result<()> {
    print_parts(response.parts())?;
    println!();
    if let Some(reason) = response.finish_reason() {
        eprintln!("finish: {reason:?}");
    }
    if let Some(usage) = &response.usage_metadata {
        print_usage(usage);
    }
    Ok(())
}

fn print_parts(parts: &[Part]) -> io::Result<()> {
    let dim = io::stdout().is_terminal();
    write_parts(&mut io::stdout().lock(), parts, dim)
}

fn write_parts(out: &mut impl Write, parts: &[Part], dim: bool) -> io::Result<()> {
    for part in parts {
        match part {
            Part::Text { text } => write!(out, "{text}"),
            Part::Thought { text } if dim => writeln!(out, "\x1b[2mthinking: {text}\x1b[0m"),
            Part::Thought { text } => writeln!(out, "thinking: {text}"),
            Part::FunctionCall(call) => writeln!(out, "\n→ {}({})", call.name, call.args),
            Part::InvalidFunctionCall(err) => {
                writeln!(out, "\n→ {}(<invalid: {}>)", err.name, err.message)
            }
            Part::FunctionResponse(_) => Ok(()),
        }?;
    }
    out.flush()
}

fn print_usage(usage: &UsageMetadata) {
    eprintln!(
        "tokens: prompt {} · output {} · thoughts {} · cached {} · total {}",
        usage.prompt_token_count,
        usage.candidates_token_count,
        usage.thoughts_token_count,
        usage.cached_content_token_count,
        usage.total_token_count
    );
}

/// Resolve the prompt from the argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_text(arg: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_text = if io::stdin().is_terminal() {
        None
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Some(buf.trim().to_string()).filter(|s| !s.is_empty())
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => Err("no prompt provided (pass text as argument or via stdin)".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_returned() {
        let err = write_parts(&mut ClosedPipe, &[Part::text("hi")], false).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn parts_render_in_order() {
        let mut out = Vec::new();
        write_parts(
            &mut out,
            &[
                Part::thought("hmm"),
                Part::text("answer"),
                Part::function_call("c1", "ls", serde_json::json!({"path": "."})),
            ],
            false,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "thinking: hmm\nanswer\n→ ls({\"path\":\".\"})\n"
        );
    }
}

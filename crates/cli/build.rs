use std::{env, fs, path::PathBuf};

fn model_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(--model <MODEL> "Model name (overrides SITELIFT_MODEL)"))
        .arg(clap::arg!(--timeout <SECS> "Completion request timeout in seconds"))
        .arg(
            clap::arg!(--replay <FILE> "Answer every completion with the contents of FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--pretty "Pretty-print the JSON result"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let extract = clap::Command::new("extract")
        .about("Extract records of one content type from a page")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML/Markdown file, or '-' for stdin"))
        .arg(clap::arg!([FIELDS] "Comma-separated fields"))
        .arg(
            clap::arg!([CONTENT_TYPE] "Content type")
                .default_value("generic")
                .value_parser(["products", "contact", "about", "faq", "policies", "generic"]),
        )
        .arg(clap::arg!(--"fetch-timeout" <SECS> "HTTP timeout for fetching the page").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"));

    let chat = clap::Command::new("chat")
        .about("Answer a question from previously extracted website data")
        .arg(clap::arg!(<PAYLOAD> "JSON payload with query and websiteData, or '-' for stdin"));

    let mut cmd = clap::Command::new("sitelift")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Sitelift Contributors")
        .about("Extract structured records from web pages")
        .arg(clap::arg!(-v --verbose "Enable debug logging and progress output on stderr").global(true))
        .subcommand(model_args(extract))
        .subcommand(model_args(chat))
        .subcommand(
            clap::Command::new("completions")
                .about("Print a shell completion script")
                .arg(clap::arg!(<SHELL> "Target shell").value_parser(["bash", "elvish", "fish", "powershell", "zsh"])),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "sitelift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "sitelift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "sitelift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "sitelift", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use biomeshift::{BiomeId, Context, FixedRegistry, Registry, Replacer, TagId};

fn main() -> ExitCode {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    log::set_logger(&LOGGER).ok();
    log::set_max_level(if config.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn });

    let replacer = Replacer::new();
    let diagnostics = match replacer.load_file(&config.rules) {
        Ok(diagnostics) => diagnostics,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    for diagnostic in &diagnostics {
        eprintln!("warning: {diagnostic}");
    }

    let registry: Box<dyn Registry> = match &config.registry {
        Some(path) => match load_registry(path) {
            Ok(registry) => Box::new(registry),
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(OpenRegistry),
    };

    for diagnostic in replacer.prepare_if_needed(registry.as_ref()) {
        eprintln!("warning: {diagnostic}");
    }
    let (direct, tags) = replacer.rule_counts();
    if config.verbose {
        eprintln!("{direct} direct rule(s), {tags} tag rule(s)");
    }

    let ctx = Context { seed: config.seed, pos: config.pos };
    let mut bad_ids = false;
    for raw in &config.ids {
        match BiomeId::parse(raw) {
            Some(id) => {
                let out = replacer.resolve(registry.as_ref(), &id, &ctx);
                println!("{id} -> {out}");
            }
            None => {
                eprintln!("warning: skipping invalid biome id '{raw}'");
                bad_ids = true;
            }
        }
    }

    if bad_ids { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// Registry used when no `--registry` file is given: every well-formed id
/// exists, no tag has members.
struct OpenRegistry;

impl Registry for OpenRegistry {
    fn exists(&self, _: &BiomeId) -> bool {
        true
    }
    fn has_tag(&self, _: &BiomeId, _: &TagId) -> bool {
        false
    }
}

/// Build a [`FixedRegistry`] from a plain text file: one biome id per line,
/// and lines starting with `#` declaring a tag followed by its members.
fn load_registry(path: &Path) -> Result<FixedRegistry, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read registry file {}: {err}", path.display()))?;

    let mut registry = FixedRegistry::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('#') {
            let mut tokens = rest.split_whitespace();
            let Some(tag) = tokens.next().and_then(TagId::parse) else {
                return Err(format!("bad tag line in {}: '{line}'", path.display()));
            };
            for member in tokens {
                let Some(member) = BiomeId::parse(member) else {
                    return Err(format!("bad tag member in {}: '{member}'", path.display()));
                };
                registry.insert_tag_member(tag.clone(), member);
            }
        } else {
            let Some(id) = BiomeId::parse(line) else {
                return Err(format!("bad biome id in {}: '{line}'", path.display()));
            };
            registry.insert(id);
        }
    }
    Ok(registry)
}

struct CliConfig {
    rules: PathBuf,
    registry: Option<PathBuf>,
    seed: Option<u64>,
    pos: Option<(f64, f64)>,
    verbose: bool,
    ids: Vec<String>,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut rules: Option<PathBuf> = None;
    let mut registry: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;
    let mut pos: Option<(f64, f64)> = None;
    let mut verbose = false;
    let mut ids: Vec<String> = Vec::new();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("biomeshift {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "-v" | "--verbose" => verbose = true,
            "--rules" => {
                let value = args.next().ok_or("error: --rules expects a file path")?;
                rules = Some(PathBuf::from(value));
            }
            "--registry" => {
                let value = args.next().ok_or("error: --registry expects a file path")?;
                registry = Some(PathBuf::from(value));
            }
            "--seed" => {
                let value = args.next().ok_or("error: --seed expects a number")?;
                seed = Some(value.parse().map_err(|_| format!("error: bad seed '{value}'"))?);
            }
            "--pos" => {
                let value = args.next().ok_or("error: --pos expects X,Z")?;
                let (x, z) = value
                    .split_once(',')
                    .ok_or_else(|| format!("error: bad position '{value}', expected X,Z"))?;
                let parsed = x.trim().parse().ok().zip(z.trim().parse().ok());
                pos = Some(parsed.ok_or_else(|| format!("error: bad position '{value}'"))?);
            }
            other if other.starts_with('-') => {
                return Err(format!("error: unknown flag '{other}' (try --help)"));
            }
            other => ids.push(other.to_string()),
        }
    }

    let rules = rules.ok_or("error: --rules is required (try --help)")?;
    if ids.is_empty() {
        return Err("error: no biome ids given (try --help)".to_string());
    }
    Ok(CliConfig { rules, registry, seed, pos, verbose, ids })
}

fn print_help() {
    println!(
        "biomeshift — resolve biome ids through a replacement rules file

USAGE:
    biomeshift --rules <FILE> [OPTIONS] <BIOME_ID>...

OPTIONS:
    --rules <FILE>       rules file (created with a commented template if absent)
    --registry <FILE>    registry snapshot: one biome id per line;
                         '#tag member...' lines declare tag membership.
                         Without this flag every well-formed id exists.
    --seed <N>           world seed for seed_stable rules
    --pos <X,Z>          lookup position for blend_range rules
    -v, --verbose        log engine details to stderr
    -h, --help           print this help
    -V, --version        print version"
    );
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

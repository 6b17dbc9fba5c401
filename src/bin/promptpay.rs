//! CLI for building and checking PromptPay payment payloads.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use promptpay_rs::models::{IdentifierKind, MonetaryAmount};
use promptpay_rs::tlv::TlvField;
use promptpay_rs::{Payload, SchemeConfig, crc};
use serde::Serialize;

/// Environment variable naming a scheme configuration file.
const SCHEME_ENV: &str = "PROMPTPAY_SCHEME";

/// Generate, verify, and inspect PromptPay QR payment payloads.
#[derive(Debug, Parser)]
#[command(name = "promptpay", version, about)]
struct Cli {
    /// Scheme configuration file (JSON). Defaults to `$PROMPTPAY_SCHEME`,
    /// then the user config directory, then built-in PromptPay.
    #[arg(long, global = true, value_name = "FILE")]
    scheme: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Build a payment payload and print it.
    Generate {
        /// Phone number, national/tax id, or e-wallet id.
        identifier: String,
        /// Identifier kind: auto, phone, national-id, or e-wallet.
        #[arg(long, default_value = "auto", value_parser = parse_kind)]
        kind: KindArg,
        /// Lock the payload to this amount (omit for a reusable code).
        #[arg(long, value_parser = parse_amount)]
        amount: Option<MonetaryAmount>,
    },
    /// Check a payload's structure and checksum.
    Verify {
        /// Payload string.
        payload: String,
    },
    /// Show the fields of a payload.
    Inspect {
        /// Payload string.
        payload: String,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print the CRC-16/CCITT-FALSE of arbitrary text.
    Checksum {
        /// Text to checksum.
        text: String,
    },
}

/// Identifier kind as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindArg {
    /// Guess from the digit count.
    Auto,
    /// Use the given kind.
    Known(IdentifierKind),
}

/// One row of `inspect` output.
#[derive(Debug, Serialize)]
struct InspectRow<'a> {
    /// Field tag.
    tag: &'a str,
    /// Human-readable field name.
    name: &'static str,
    /// Field value.
    value: &'a str,
    /// Decoded sub-fields of the merchant account template.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nested: Vec<TlvField>,
}

/// Parses `--kind` for clap.
fn parse_kind(s: &str) -> Result<KindArg, String> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(KindArg::Auto);
    }
    s.parse().map(KindArg::Known).map_err(|err| format!("{err}"))
}

/// Parses `--amount` for clap.
fn parse_amount(s: &str) -> Result<MonetaryAmount, String> {
    s.parse().map_err(|err| format!("{err}"))
}

/// Resolves the scheme configuration: explicit path, then
/// `$PROMPTPAY_SCHEME`, then the default config file or PromptPay.
fn load_scheme(path: Option<PathBuf>) -> promptpay_rs::Result<SchemeConfig> {
    let from_env = std::env::var_os(SCHEME_ENV)
        .filter(|val| !val.is_empty())
        .map(PathBuf::from);
    match path.or(from_env) {
        Some(file) => SchemeConfig::from_file(file),
        None => SchemeConfig::load_default(),
    }
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let scheme = match load_scheme(cli.scheme) {
        Ok(scheme) => scheme,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to load scheme configuration: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    dispatch(&scheme, cli.command)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch(scheme: &SchemeConfig, command: Command) -> io::Result<ExitCode> {
    match command {
        Command::Generate {
            identifier,
            kind,
            amount,
        } => cmd_generate(scheme, identifier, kind, amount),
        Command::Verify { payload } => cmd_verify(&payload),
        Command::Inspect { payload, json } => cmd_inspect(scheme, &payload, json),
        Command::Checksum { text } => cmd_checksum(&text),
    }
}

/// Executes the `generate` subcommand.
fn cmd_generate(
    scheme: &SchemeConfig,
    identifier: String,
    kind: KindArg,
    amount: Option<MonetaryAmount>,
) -> io::Result<ExitCode> {
    let mut builder = Payload::builder().scheme(scheme.clone());
    builder = match kind {
        KindArg::Auto => builder.detect_identifier(identifier),
        KindArg::Known(known) => builder.identifier(identifier, known),
    };
    if let Some(value) = amount {
        builder = builder.amount(value);
    }

    match builder.build() {
        Ok(payload) => {
            writeln!(io::stdout().lock(), "{payload}")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to generate payload: {err}",
                "error:".red().bold()
            )?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `verify` subcommand.
fn cmd_verify(input: &str) -> io::Result<ExitCode> {
    match Payload::parse(input) {
        Ok(payload) => {
            writeln!(
                io::stdout().lock(),
                "{} checksum {} matches",
                "valid:".green().bold(),
                payload.checksum().bold()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            writeln!(io::stderr().lock(), "{} {err}", "invalid:".red().bold())?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes the `inspect` subcommand.
fn cmd_inspect(scheme: &SchemeConfig, input: &str, json: bool) -> io::Result<ExitCode> {
    let payload = match Payload::parse(input) {
        Ok(payload) => payload,
        Err(err) => {
            writeln!(io::stderr().lock(), "{} {err}", "invalid:".red().bold())?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let rows = inspect_rows(scheme, &payload);
    if json {
        let rendered = serde_json::to_string_pretty(&rows).map_err(io::Error::other)?;
        writeln!(io::stdout().lock(), "{rendered}")?;
    } else {
        print_fields_table(&rows)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `checksum` subcommand.
fn cmd_checksum(text: &str) -> io::Result<ExitCode> {
    writeln!(io::stdout().lock(), "{}", crc::checksum(text))?;
    Ok(ExitCode::SUCCESS)
}

// ── Output formatting ────────────────────────────────────────────────

/// Builds inspect rows, decoding the merchant account template when it
/// is well-formed.
fn inspect_rows<'a>(scheme: &SchemeConfig, payload: &'a Payload) -> Vec<InspectRow<'a>> {
    payload
        .fields()
        .iter()
        .map(|field| {
            let is_account = field.tag() == scheme.merchant_account_tag;
            InspectRow {
                tag: field.tag(),
                name: if is_account {
                    "Merchant Account Information"
                } else {
                    field_name(field.tag())
                },
                value: field.value(),
                nested: if is_account {
                    field.nested().unwrap_or_default()
                } else {
                    Vec::new()
                },
            }
        })
        .collect()
}

/// Returns a human-readable name for a root-level tag.
fn field_name(tag: &str) -> &'static str {
    match tag {
        "00" => "Payload Format Indicator",
        "01" => "Point of Initiation Method",
        "52" => "Merchant Category Code",
        "53" => "Transaction Currency",
        "54" => "Transaction Amount",
        "58" => "Country Code",
        "59" => "Merchant Name",
        "60" => "Merchant City",
        "62" => "Additional Data",
        "63" => "CRC",
        _ => "Unknown Tag",
    }
}

/// Prints payload fields in a table, nested fields indented below their
/// template.
fn print_fields_table(rows: &[InspectRow<'_>]) -> io::Result<()> {
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Tag").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Len").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Cyan),
    ]);

    for row in rows {
        _ = table.add_row(vec![
            Cell::new(row.tag),
            Cell::new(row.name),
            Cell::new(row.value.chars().count()),
            Cell::new(row.value),
        ]);
        for inner in &row.nested {
            _ = table.add_row(vec![
                Cell::new(format!("  {}.{}", row.tag, inner.tag())).fg(Color::DarkGrey),
                Cell::new(""),
                Cell::new(inner.len()).fg(Color::DarkGrey),
                Cell::new(inner.value()),
            ]);
        }
    }

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        "Payload".green().bold(),
        format_args!("({} fields)", rows.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    /// Phone 081-234-5678, 125.00 THB.
    const PHONE_DYNAMIC: &str =
        "00020101021229370016A000000677010111011300668123456785802TH53037645406125.0063043553";

    #[test]
    fn parse_kind_values() {
        assert_eq!(parse_kind("auto").unwrap(), KindArg::Auto);
        assert_eq!(
            parse_kind("national-id").unwrap(),
            KindArg::Known(IdentifierKind::NationalId)
        );
        assert!(parse_kind("iban").unwrap_err().contains("unsupported"));
    }

    #[test]
    fn parse_amount_values() {
        assert_eq!(parse_amount("125").unwrap().formatted(), "125.00");
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("ten").is_err());
    }

    #[test]
    fn cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "promptpay",
            "generate",
            "0812345678",
            "--kind",
            "phone",
            "--amount",
            "125",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Generate {
                kind: KindArg::Known(IdentifierKind::Phone),
                amount: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn cli_rejects_unknown_kind() {
        let result = Cli::try_parse_from(["promptpay", "generate", "1", "--kind", "iban"]);
        assert!(result.is_err());
    }

    #[test]
    fn load_scheme_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"merchantAccountTag": "30"}}"#).unwrap();
        let scheme = load_scheme(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(scheme.merchant_account_tag, "30");
    }

    #[test]
    fn load_scheme_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_scheme(Some(dir.path().join("absent.json"))).is_err());
    }

    // ── cmd_* tests ──────────────────────────────────────────────────

    #[test]
    fn cmd_generate_success() {
        let amount = MonetaryAmount::new(125.0).ok();
        let code = cmd_generate(
            &SchemeConfig::promptpay(),
            "0812345678".to_owned(),
            KindArg::Auto,
            amount,
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn cmd_generate_invalid_identifier() {
        let code = cmd_generate(
            &SchemeConfig::promptpay(),
            "n/a".to_owned(),
            KindArg::Known(IdentifierKind::Phone),
            None,
        )
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn cmd_verify_valid_and_tampered() {
        assert_eq!(cmd_verify(PHONE_DYNAMIC).unwrap(), ExitCode::SUCCESS);
        let tampered = PHONE_DYNAMIC.replace("125.00", "925.00");
        assert_eq!(cmd_verify(&tampered).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn cmd_inspect_table_and_json() {
        let scheme = SchemeConfig::promptpay();
        assert_eq!(
            cmd_inspect(&scheme, PHONE_DYNAMIC, false).unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(
            cmd_inspect(&scheme, PHONE_DYNAMIC, true).unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(
            cmd_inspect(&scheme, "garbage", false).unwrap(),
            ExitCode::FAILURE
        );
    }

    #[test]
    fn cmd_checksum_succeeds() {
        assert_eq!(cmd_checksum("123456789").unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn inspect_rows_decode_merchant_account() {
        let scheme = SchemeConfig::promptpay();
        let payload = Payload::parse(PHONE_DYNAMIC).unwrap();
        let rows = inspect_rows(&scheme, &payload);
        let names: Vec<&str> = rows.iter().map(|row| row.name).collect();
        assert_eq!(
            names,
            [
                "Payload Format Indicator",
                "Point of Initiation Method",
                "Merchant Account Information",
                "Country Code",
                "Transaction Currency",
                "Transaction Amount",
                "CRC",
            ]
        );
        let account = rows.get(2).unwrap();
        assert_eq!(account.nested.len(), 2);
        assert!(rows.iter().filter(|row| row.tag != "29").all(|row| row.nested.is_empty()));
    }

    #[test]
    fn inspect_rows_serialize_without_empty_nested() {
        let scheme = SchemeConfig::promptpay();
        let payload = Payload::parse(PHONE_DYNAMIC).unwrap();
        let json = serde_json::to_value(inspect_rows(&scheme, &payload)).unwrap();
        assert!(json[0].get("nested").is_none());
        assert_eq!(json[2]["nested"][1]["value"], "0066812345678");
    }

    #[test]
    fn field_name_unknown() {
        assert_eq!(field_name("99"), "Unknown Tag");
    }

    // ── dispatch tests ───────────────────────────────────────────────

    #[test]
    fn dispatch_checksum() {
        let code = dispatch(
            &SchemeConfig::promptpay(),
            Command::Checksum {
                text: String::new(),
            },
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn dispatch_verify() {
        let code = dispatch(
            &SchemeConfig::promptpay(),
            Command::Verify {
                payload: PHONE_DYNAMIC.to_owned(),
            },
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}

//! Build a payment payload, read it back, then build one for a custom scheme.
//!
//! Run: `cargo run --example generate_payload`

use std::process::ExitCode;

use promptpay_rs::models::{IdentifierKind, MonetaryAmount};
use promptpay_rs::scheme::IdentifierSlot;
use promptpay_rs::{Payload, SchemeConfig};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // PromptPay phone number, locked to 125 THB
    let payload = Payload::builder()
        .identifier("081-234-5678", IdentifierKind::Phone)
        .amount(MonetaryAmount::new(125.0)?)
        .build()?;
    println!("PromptPay payload: {payload}");

    let parsed = Payload::parse(payload.as_str())?;
    println!(
        "  initiation={:?} amount={} currency={} checksum={}",
        parsed.point_of_initiation(),
        parsed.amount().unwrap_or("-"),
        parsed.currency().unwrap_or("-"),
        parsed.checksum()
    );
    for field in parsed.fields() {
        println!("  {} ({:02}) {}", field.tag(), field.len(), field.value());
    }

    // Same encoder, different network: outer tag 26, SGD, no country field
    let scheme = SchemeConfig {
        merchant_account_tag: "26".to_owned(),
        guid: "SG.PAYNOW".to_owned(),
        phone: Some(IdentifierSlot::new("02")),
        national_id: None,
        e_wallet: None,
        trunk_prefix: String::new(),
        country_calling_code: "65".to_owned(),
        country_code: None,
        currency_code: "702".to_owned(),
    };
    scheme.validate()?;

    let custom = Payload::builder()
        .scheme(scheme)
        .identifier("+65 9123 4567", IdentifierKind::Phone)
        .build()?;
    println!("Custom scheme payload: {custom}");
    let _verified = Payload::parse(custom.as_str())?;
    println!("  checksum {} verified", custom.checksum());

    Ok(())
}

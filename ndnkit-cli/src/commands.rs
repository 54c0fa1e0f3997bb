use std::fs;
use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use log::debug;

use ndnkit_core::{
    Blob, BinaryXmlWireFormat, Data, ExcludeEntry, ForwardingEntry, Interest, KeyLocator,
    KeyLocatorType, Name, TlvWireFormat, WireFormat,
};

pub fn decode(matches: &ArgMatches) -> Result<()> {
    let bytes = read_packet_bytes(matches)?;
    debug!("decoding {} bytes", bytes.len());

    let format: Box<dyn WireFormat> = match matches.get_one::<String>("format").unwrap().as_str() {
        "tlv" => Box::new(TlvWireFormat),
        "binary-xml" | "bxml" => Box::new(BinaryXmlWireFormat),
        other => bail!("unknown wire format '{}'", other),
    };
    let input = Blob::from(bytes.as_slice());

    let mut interest = Interest::new(Name::new());
    if interest.wire_decode_with(&input, format.as_ref()).is_ok() {
        print_interest(&interest);
        return Ok(());
    }

    let mut data = Data::new(Name::new());
    if let Ok((signed_begin, signed_end)) = data.wire_decode_with(&input, format.as_ref()) {
        print_data(&data, signed_begin, signed_end);
        return Ok(());
    }

    let mut entry = ForwardingEntry::new();
    if entry.wire_decode_with(&input, format.as_ref()).is_ok() {
        print_forwarding_entry(&entry);
        return Ok(());
    }

    bail!("input is not an Interest, Data, or ForwardingEntry in the selected format")
}

pub fn name(matches: &ArgMatches) -> Result<()> {
    let uri = matches.get_one::<String>("uri").unwrap();
    let name = Name::from_uri(uri);
    println!("{}", name.to_uri());
    println!("components: {}", name.size());
    for component in name.components() {
        println!("  {} ({} bytes)", component.value(), component.len());
    }
    Ok(())
}

fn read_packet_bytes(matches: &ArgMatches) -> Result<Vec<u8>> {
    if let Some(path) = matches.get_one::<String>("file") {
        return fs::read(path).with_context(|| format!("reading {}", path));
    }
    let text = match matches.get_one::<String>("hex") {
        Some(hex_text) => hex_text.clone(),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            buffer
        }
    };
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&cleaned).context("input is not valid hex")
}

fn print_interest(interest: &Interest) {
    println!("Interest {}", interest.to_uri());
    println!("  name components: {}", interest.name().size());
    let nonce = interest.nonce();
    if !nonce.is_null() {
        println!("  nonce: {}", nonce);
    }
    if interest.interest_lifetime_ms() >= 0.0 {
        println!("  lifetime: {} ms", interest.interest_lifetime_ms());
    }
    if interest.must_be_fresh() {
        println!("  must be fresh");
    }
    if !interest.exclude().is_empty() {
        let entries: Vec<String> = interest
            .exclude()
            .entries()
            .iter()
            .map(|entry| match entry {
                ExcludeEntry::Any => "*".to_string(),
                ExcludeEntry::Component(c) => c.to_string(),
            })
            .collect();
        println!("  exclude: {}", entries.join(","));
    }
    print_key_locator("  ", interest.key_locator());
}

fn print_data(data: &Data, signed_begin: usize, signed_end: usize) {
    println!("Data {}", data.name());
    println!("  content: {} bytes", data.content().size());
    println!("  content type: {:?}", data.meta_info().content_type());
    if data.meta_info().freshness_period_ms() >= 0.0 {
        println!("  freshness: {} ms", data.meta_info().freshness_period_ms());
    }
    if let Some(final_block_id) = data.meta_info().final_block_id() {
        println!("  final block id: {}", final_block_id);
    }
    println!(
        "  signature: {:?}, {} bytes",
        data.signature().signature_type(),
        data.signature().signature().size()
    );
    print_key_locator("  ", data.signature().key_locator());
    println!("  signed portion: [{}, {})", signed_begin, signed_end);
}

fn print_forwarding_entry(entry: &ForwardingEntry) {
    println!("ForwardingEntry {}", entry.prefix());
    if let Some(action) = entry.action() {
        println!("  action: {}", action);
    }
    if entry.face_id() >= 0 {
        println!("  face id: {}", entry.face_id());
    }
    println!("  flags: {:#04x}", entry.forwarding_flags().bits());
    if entry.freshness_period_ms() >= 0.0 {
        println!("  freshness: {} ms", entry.freshness_period_ms());
    }
}

fn print_key_locator(indent: &str, key_locator: &KeyLocator) {
    match key_locator.locator_type() {
        KeyLocatorType::None => {}
        KeyLocatorType::KeyName => {
            println!("{}key locator: name {}", indent, key_locator.key_name());
        }
        KeyLocatorType::KeyLocatorDigest => {
            println!("{}key locator: digest {}", indent, key_locator.key_data());
        }
        KeyLocatorType::Key => {
            println!("{}key locator: key, {} bytes", indent, key_locator.key_data().size());
        }
        KeyLocatorType::Certificate => {
            println!(
                "{}key locator: certificate, {} bytes",
                indent,
                key_locator.key_data().size()
            );
        }
    }
}

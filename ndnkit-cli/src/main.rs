use std::process;

use clap::{Arg, Command};
use log::error;

mod commands;

fn main() {
    env_logger::init();

    let matches = Command::new("ndnkit")
        .version("0.1.0")
        .about("NDN packet inspector - decode and pretty-print NDN-TLV and Binary XML packets")
        .subcommand(
            Command::new("decode")
                .about("Decode a packet and print its fields")
                .arg(
                    Arg::new("hex")
                        .value_name("HEX")
                        .help("Packet bytes as hex (reads stdin when omitted)"),
                )
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .value_name("FILE")
                        .help("Read raw packet bytes from a file"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_name("FORMAT")
                        .help("Wire format: tlv or binary-xml")
                        .default_value("tlv"),
                ),
        )
        .subcommand(
            Command::new("name")
                .about("Parse a name URI and print its components")
                .arg(
                    Arg::new("uri")
                        .value_name("URI")
                        .required(true)
                        .help("Name URI, e.g. ndn:/example/%00%01/data"),
                ),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .get_matches();

    let result = match matches.subcommand() {
        Some(("decode", sub_matches)) => commands::decode(sub_matches),
        Some(("name", sub_matches)) => commands::name(sub_matches),
        _ => unreachable!("subcommand_required"),
    };

    if let Err(err) = result {
        error!("{:#}", err);
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

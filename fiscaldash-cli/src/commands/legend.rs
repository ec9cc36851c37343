//! Legend command - print the CFOP descriptions

use anyhow::Result;
use colored::Colorize;

use fiscaldash_core::domain::cfop::{
    self, CODE_NOT_FOUND_DESCRIPTION, OTHER_DESCRIPTION, UNIDENTIFIED_CODE,
};

use crate::output;

pub fn run(json: bool) -> Result<()> {
    let legend = cfop::legend();

    if json {
        let entries: Vec<_> = legend
            .iter()
            .map(|(code, description)| {
                serde_json::json!({"code": code, "description": description})
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["CFOP", "Description"]);
    for (code, description) in legend {
        table.add_row(vec![*code, *description]);
    }

    println!("{}", "CFOP legend".bold());
    println!("{}", table);
    println!(
        "Codes not listed are shown as '{}'. Rows without a code use '{}' ({}).",
        OTHER_DESCRIPTION, UNIDENTIFIED_CODE, CODE_NOT_FOUND_DESCRIPTION
    );
    Ok(())
}

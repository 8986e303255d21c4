//! Instructions sent to the vision model.
//!
//! All prompt text lives here so the protocol can be read, and tested, in one
//! place. Prompts are pure functions of the discovered header list; they never
//! branch on document content.

/// Round 1 of the template flow: ask for the charge column headers only.
pub const DISCOVERY_PROMPT: &str = r#"Analyze the provided image of a ledger or bill.
Your first task is to identify all the unique charge or expense column headers in the table.
List only the names of these charge columns.
Return the result as a clean, single-line, comma-separated string.
Example: Property Tax,Water Charges,Sinking Fund,Maint. Charges"#;

/// Single round of the direct-export flow: literal table transcription.
pub const DIRECT_EXPORT_PROMPT: &str = r#"You are an expert at table data extraction.
Analyze the provided image and identify the main table.
Extract all the data from the table exactly as it appears, row by row.
Return the result as a valid JSON array of objects, where each object represents a row.
Use the table's headers as the keys for each object.
Do not add, omit, or transform any data. Preserve the exact structure and content.
The output must only be the raw JSON array."#;

/// Round 2 of the template flow.
///
/// Embeds every discovered header, in order, both in the task statement and
/// in the `Charges` schema example, so the model fills exactly those keys.
pub fn extraction_prompt(headers: &[String]) -> String {
    let charges_schema = headers
        .iter()
        .map(|h| format!("                {}: \"float or null\"", json_key(h)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"You are an expert data entry clerk. Analyze the provided image of a ledger.
Based on the following charge categories that were discovered from this document: {categories}
Your task is to extract information for every single member listed and structure the data into a valid JSON array.

RULES FOR EXTRACTION:
1. For each member, you MUST extract their "Wing", "Unit No", and "Member Name".
2. If a "Member Name" is not explicitly given for a row, set its value to null.
3. For each discovered charge category, extract the corresponding monetary value for the member.
4. If a member does not have a value for a specific charge (i.e., the cell is blank), you MUST represent it as null in the output.
5. The final output must be a clean, raw JSON array and nothing else.

The JSON schema you must follow is:
[
    {{
        "Wing": "string or null",
        "Unit No": "string or null",
        "Member Name": "string or null",
        "Charges": {{
{charges_schema}
        }}
    }}
]"#,
        categories = headers.join(", "),
    )
}

/// Quote a header as a JSON object key, escaping what needs escaping.
fn json_key(header: &str) -> String {
    serde_json::Value::String(header.to_string()).to_string()
}

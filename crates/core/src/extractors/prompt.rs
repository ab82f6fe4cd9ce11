// The ontology description is appended verbatim when present; its content
// is the caller's business.
pub fn system_instructions(ontology_description: &str) -> String {
    let mut instructions = String::from(
        r#"Extract a knowledge graph of entities and relationships from the text you are given.

Respond with a single JSON object of this exact shape and nothing else:
{
  "entities": [
    {"name": "Singapore", "properties": [{"key": "population", "value": 5600000}]}
  ],
  "relationships": [
    {"source": "Singapore", "target": "Asia", "relation": "located_in"}
  ]
}

Rules:
- every relationship source and target must exactly match the name of a listed entity
- entity names must be unique within the graph
- relation labels are short verb phrases such as "located_in" or "works_at"
- property values must be strings or numbers; properties may be omitted entirely
- do not wrap the JSON in markdown or add commentary"#,
    );

    let ontology = ontology_description.trim();
    if !ontology.is_empty() {
        instructions.push_str("\n\nFollow this ontology when naming entities and relations:\n");
        instructions.push_str(ontology);
    }

    instructions
}

// Single-string variant for backends without a separate system message.
pub fn compose_prompt(segment_text: &str, ontology_description: &str) -> String {
    format!(
        "{}\n\nText:\n{}",
        system_instructions(ontology_description),
        segment_text
    )
}

/// Derives the registry entity name for a table: split on underscores,
/// upper-case the first character of each segment, lower-case the rest,
/// and concatenate. `order_items` becomes `OrderItems`.
pub fn entity_name(table: &str) -> String {
    table
        .split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Alphabet for minted ids; lowercase keeps them readable in exported documents.
const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Session-local id for steps, groups and annotations.
///
/// These ids never survive a fetch cycle; anything persisted keys on slot names instead.
pub fn shortid() -> String {
    nanoid::nanoid!(10, &ID_ALPHABET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortid_is_distinct_and_sized() {
        let a = shortid();
        let b = shortid();
        assert_eq!(a.len(), 10);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

//! Display helpers shared by users and contacts.

use uuid::Uuid;

/// Avatar palette used for generated profiles.
pub const AVATAR_COLORS: [&str; 8] = [
    "#FF7A00", "#9327FF", "#FF5EB3", "#FFBB2B", "#1FD7C1", "#462F8A", "#FF3D00", "#7AE229",
];

/// First letter of each word, uppercased, at most two letters.
pub fn initials_for(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// Picks a palette color at random.
pub fn random_avatar_color() -> &'static str {
    let index = (Uuid::new_v4().as_u128() % AVATAR_COLORS.len() as u128) as usize;
    AVATAR_COLORS[index]
}

#[cfg(test)]
mod tests {
    use super::{initials_for, random_avatar_color, AVATAR_COLORS};

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials_for("Sofia Müller"), "SM");
        assert_eq!(initials_for("anna maria lopez"), "AM");
        assert_eq!(initials_for("  Cher  "), "C");
        assert_eq!(initials_for(""), "");
    }

    #[test]
    fn random_color_comes_from_palette() {
        for _ in 0..32 {
            assert!(AVATAR_COLORS.contains(&random_avatar_color()));
        }
    }
}

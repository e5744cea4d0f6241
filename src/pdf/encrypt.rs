//! Password protection and the password-strength meter

use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions, StringFormat};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::pdf::document::stamp_info;

/// Shortest password accepted unless configured otherwise
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Key length for the RC4 standard security handler, in bits
const KEY_LENGTH: usize = 128;

/// What a reader of the encrypted document may do
///
/// Form filling and accessibility extraction are always granted; document
/// assembly never is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentPermissions {
    pub printing: bool,
    pub modifying: bool,
    pub copying: bool,
    pub annotating: bool,
}

impl DocumentPermissions {
    /// Engine permission flags for these choices
    pub fn to_flags(self) -> Permissions {
        let mut flags = Permissions::FILLABLE | Permissions::COPYABLE_FOR_ACCESSIBILITY;
        if self.printing {
            flags |= Permissions::PRINTABLE | Permissions::PRINTABLE_IN_HIGH_QUALITY;
        }
        if self.modifying {
            flags |= Permissions::MODIFIABLE;
        }
        if self.copying {
            flags |= Permissions::COPYABLE;
        }
        if self.annotating {
            flags |= Permissions::ANNOTABLE;
        }
        flags
    }
}

/// Check a password and its confirmation before anything is read
pub fn validate_passwords(password: &str, confirmation: &str, min_length: usize) -> Result<()> {
    if password.is_empty() {
        return Err(Error::EmptyPassword);
    }
    if password != confirmation {
        return Err(Error::PasswordMismatch);
    }
    if password.chars().count() < min_length {
        return Err(Error::PasswordTooShort(min_length));
    }
    Ok(())
}

/// Encrypt the document; the same password opens and owns it
///
/// The Info dictionary is refreshed first so its strings are encrypted with
/// the rest of the document.
#[instrument(skip(doc, password))]
pub fn encrypt_document(doc: &mut Document, password: &str, permissions: DocumentPermissions) -> Result<()> {
    stamp_info(doc)?;
    ensure_document_id(doc);

    let version = EncryptionVersion::V2 {
        document: &*doc,
        owner_password: password,
        user_password: password,
        key_length: KEY_LENGTH,
        permissions: permissions.to_flags(),
    };
    let state = EncryptionState::try_from(version)
        .map_err(|e| Error::General(format!("Cannot set up encryption: {e}")))?;
    doc.encrypt(&state)?;

    info!(?permissions, "document encrypted");
    Ok(())
}

/// The standard security handler keys off the first `/ID` entry
fn ensure_document_id(doc: &mut Document) {
    if doc.trailer.get(b"ID").is_ok() {
        return;
    }
    let id = Uuid::new_v4().as_bytes().to_vec();
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id, StringFormat::Hexadecimal),
        ]),
    );
}

/// Rough password strength, as shown next to the password field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0 to 100
    pub score: u8,
    pub label: &'static str,
}

/// Score a password on length and character classes
///
/// Length contributes 10 points per three characters (at most 60), then
/// 10 each for upper case, lower case and digits and 20 for anything else.
pub fn password_strength(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength { score: 0, label: "No password" };
    }

    let mut score = (password.chars().count() / 3).min(6) as u32 * 10;
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        score += 10;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        score += 10;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 10;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        score += 20;
    }
    let score = score.min(100) as u8;

    let label = match score {
        0..=29 => "Weak",
        30..=59 => "Moderate",
        60..=79 => "Strong",
        _ => "Very Strong",
    };
    PasswordStrength { score, label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Size;
    use crate::pdf::create::create_labelled_document;
    use crate::pdf::document::save_document;

    #[test]
    fn test_validate_passwords() {
        assert!(matches!(validate_passwords("", "", 6), Err(Error::EmptyPassword)));
        assert!(matches!(validate_passwords("secret1", "secret2", 6), Err(Error::PasswordMismatch)));
        assert!(matches!(validate_passwords("abc", "abc", 6), Err(Error::PasswordTooShort(6))));
        assert!(validate_passwords("abcdef", "abcdef", 6).is_ok());
    }

    #[test]
    fn test_password_strength() {
        assert_eq!(password_strength(""), PasswordStrength { score: 0, label: "No password" });
        // 1 char: length 0, lower 10
        assert_eq!(password_strength("a").label, "Weak");
        // 8 chars: 20 + lower 10 + digit 10
        assert_eq!(password_strength("abcdef12").score, 40);
        assert_eq!(password_strength("abcdef12").label, "Moderate");
        // 12 chars: 40 + upper + lower + digit + symbol
        assert_eq!(password_strength("Abcdefgh12!x").score, 90);
        assert_eq!(password_strength("Abcdefgh12!x").label, "Very Strong");
        // Capped
        assert_eq!(password_strength("Aa1!Aa1!Aa1!Aa1!Aa1!Aa1!").score, 100);
    }

    #[test]
    fn test_permission_flags() {
        let none = DocumentPermissions::default().to_flags();
        assert!(none.contains(Permissions::FILLABLE));
        assert!(!none.contains(Permissions::PRINTABLE));
        assert!(!none.contains(Permissions::ASSEMBLABLE));

        let print = DocumentPermissions { printing: true, ..Default::default() }.to_flags();
        assert!(print.contains(Permissions::PRINTABLE));
        assert!(!print.contains(Permissions::COPYABLE));
    }

    #[test]
    fn test_encrypt_marks_document() {
        let mut doc = create_labelled_document("A", 1, Size::letter());
        encrypt_document(&mut doc, "secret", DocumentPermissions::default()).unwrap();
        assert!(doc.is_encrypted());
        assert!(doc.trailer.get(b"ID").is_ok());
    }

    #[test]
    fn test_info_strings_are_encrypted() {
        let mut doc = create_labelled_document("A", 1, Size::letter());
        encrypt_document(&mut doc, "hunter22", DocumentPermissions::default()).unwrap();
        let bytes = save_document(&mut doc).unwrap();

        let raw = String::from_utf8_lossy(&bytes);
        assert!(raw.contains("/Encrypt"));
        assert!(raw.contains("/Info"));
        assert!(!raw.contains("(pdf-tools "));
    }
}

//! Documentation text derived from declarations
//!
//! Text comes from identifier words: `userName` documents as "The user
//! name.", `GetUserName` summarises as "Get user name.". Constructors,
//! properties, type parameters and task-returning methods use the standard
//! phrasings.

use sharpfix_core::CsSyntaxKind;
use sharpfix_core::cst::ast::MemberDecl;

/// Split an identifier into words at case changes, digits-to-letters and
/// underscores; acronyms stay together and keep their case
pub fn words(identifier: &str) -> Vec<String> {
    let identifier = identifier.trim_start_matches('@');
    let chars: Vec<char> = identifier.chars().collect();
    let mut raw: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !current.is_empty() {
                raw.push(std::mem::take(&mut current));
            }
            continue;
        }
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let boundary = match prev {
            Some(p) if p == '_' => false,
            Some(p) if c.is_uppercase() && p.is_lowercase() => true,
            Some(p) if c.is_uppercase() && p.is_uppercase() => next.is_some_and(char::is_lowercase),
            Some(p) if c.is_alphabetic() && p.is_ascii_digit() => true,
            _ => false,
        };
        if boundary && !current.is_empty() {
            raw.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        raw.push(current);
    }
    raw.into_iter()
        .map(|w| {
            let acronym = w.chars().count() > 1 && w.chars().all(|c| !c.is_lowercase());
            if acronym { w } else { w.to_lowercase() }
        })
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `GetUserName` -> "Get user name."
pub fn sentence(identifier: &str) -> String {
    format!("{}.", capitalize(&words(identifier).join(" ")))
}

/// `userName` -> "The user name."
pub fn noun_phrase(identifier: &str) -> String {
    format!("The {}.", words(identifier).join(" "))
}

/// Type name as written in a `cref`: generic types use braces
pub fn cref(name: &str, type_parameters: &[String]) -> String {
    if type_parameters.is_empty() {
        name.to_string()
    } else {
        format!("{}{{{}}}", name, type_parameters.join(","))
    }
}

/// Text of a type parameter: `TKey` -> "The type of the key."
pub fn type_parameter_text(name: &str) -> String {
    let rest = name.strip_prefix('T').filter(|r| r.chars().next().is_some_and(char::is_uppercase));
    match rest {
        Some(rest) => format!("The type of the {}.", words(rest).join(" ")),
        None => "The type parameter.".to_string(),
    }
}

/// Summary for a constructor of `owner`
pub fn constructor_summary(member: &MemberDecl, owner: &MemberDecl) -> String {
    let owner_name = owner.name().unwrap_or_default();
    let target = cref(&owner_name, &owner.type_parameters());
    let noun = if owner.kind() == CsSyntaxKind::StructDecl {
        "struct"
    } else {
        "class"
    };
    if member.has_modifier(CsSyntaxKind::StaticKw) {
        format!("Initializes static members of the <see cref=\"{target}\"/> {noun}.")
    } else {
        format!("Initializes a new instance of the <see cref=\"{target}\"/> {noun}.")
    }
}

/// Whether a property has a setter callers can use
fn has_visible_setter(member: &MemberDecl) -> bool {
    member.accessors().iter().any(|a| {
        matches!(a.keyword().as_deref(), Some("set") | Some("init"))
            && !a.modifiers().iter().any(|m| m.kind() == CsSyntaxKind::PrivateKw)
    })
}

/// Summary for a property: "Gets the x." or "Gets or sets the x."
pub fn property_summary(member: &MemberDecl) -> String {
    let verb = if has_visible_setter(member) {
        "Gets or sets"
    } else {
        "Gets"
    };
    let name = member.name().unwrap_or_default();
    format!("{} the {}.", verb, words(&name).join(" "))
}

/// Text of `<returns>`, `None` for `void` and untyped members
pub fn returns_text(member: &MemberDecl) -> Option<String> {
    let return_type = member.return_type()?;
    if return_type == "void" {
        return None;
    }
    let base = return_type.split('<').next().unwrap_or_default();
    let generic = return_type.contains('<');
    if matches!(base, "Task" | "ValueTask") {
        return Some(if generic {
            format!(
                "A <see cref=\"{base}{{TResult}}\"/> representing the result of the asynchronous operation."
            )
        } else {
            format!("A <see cref=\"{base}\"/> representing the asynchronous operation.")
        });
    }
    let name = member.name().unwrap_or_default();
    let subject = name
        .strip_prefix("Get")
        .filter(|rest| rest.chars().next().is_some_and(char::is_uppercase));
    Some(match subject {
        Some(rest) => noun_phrase(rest),
        None => "The result.".to_string(),
    })
}

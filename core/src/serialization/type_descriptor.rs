use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;


/// Identifies the logical type a JSON payload encodes.
///
/// A descriptor is a base name plus ordered parameter types, printed as a
/// signature such as `map<string,list<long>>`. Two descriptors name the same
/// type exactly when their signatures are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDescriptor {
  base_name: Cow<'static, str>,
  parameter_types: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
  pub const BOOLEAN: &'static str = "boolean";
  pub const CHAR: &'static str = "char";
  pub const BYTE: &'static str = "byte";
  pub const SHORT: &'static str = "short";
  pub const INTEGER: &'static str = "integer";
  pub const LONG: &'static str = "long";
  pub const UNSIGNED_BYTE: &'static str = "ubyte";
  pub const UNSIGNED_SHORT: &'static str = "ushort";
  pub const UNSIGNED_INTEGER: &'static str = "uinteger";
  pub const UNSIGNED_LONG: &'static str = "ulong";
  pub const FLOAT: &'static str = "float";
  pub const DOUBLE: &'static str = "double";
  pub const STRING: &'static str = "string";
  pub const LIST: &'static str = "list";
  pub const SET: &'static str = "set";
  pub const MAP: &'static str = "map";
  pub const NULLABLE: &'static str = "nullable";
  pub const SHARED: &'static str = "shared";
  pub const CONNECTOR: &'static str = "connector";

  pub fn of(base_name: impl Into<Cow<'static, str>>) -> Self {
    Self {
      base_name: base_name.into(),
      parameter_types: Vec::new(),
    }
  }

  pub fn generic(
    base_name: impl Into<Cow<'static, str>>,
    parameter_types: impl IntoIterator<Item = TypeDescriptor>,
  ) -> Self {
    Self {
      base_name: base_name.into(),
      parameter_types: parameter_types.into_iter().collect(),
    }
  }

  pub fn list_of(element: TypeDescriptor) -> Self {
    Self::generic(Self::LIST, [element])
  }

  pub fn set_of(element: TypeDescriptor) -> Self {
    Self::generic(Self::SET, [element])
  }

  pub fn map_of(key: TypeDescriptor, value: TypeDescriptor) -> Self {
    Self::generic(Self::MAP, [key, value])
  }

  pub fn nullable(inner: TypeDescriptor) -> Self {
    Self::generic(Self::NULLABLE, [inner])
  }

  pub fn shared(inner: TypeDescriptor) -> Self {
    Self::generic(Self::SHARED, [inner])
  }

  pub fn base_name(&self) -> &str {
    &self.base_name
  }

  pub fn parameter_types(&self) -> &[TypeDescriptor] {
    &self.parameter_types
  }

  pub fn parameter(&self, index: usize) -> Option<&TypeDescriptor> {
    self.parameter_types.get(index)
  }

  pub fn is_generic(&self) -> bool {
    !self.parameter_types.is_empty()
  }

  /// Canonical text form, also used as the registry key.
  pub fn signature(&self) -> String {
    self.to_string()
  }
}

impl Display for TypeDescriptor {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.base_name)?;
    if self.parameter_types.is_empty() {
      return Ok(());
    }
    f.write_str("<")?;
    for (index, parameter) in self.parameter_types.iter().enumerate() {
      if index > 0 {
        f.write_str(",")?;
      }
      write!(f, "{}", parameter)?;
    }
    f.write_str(">")
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptorParseError {
  #[error("Empty type name at position {0}")]
  EmptyName(usize),
  #[error("Unexpected character {found:?} at position {position}")]
  UnexpectedCharacter { position: usize, found: char },
  #[error("Unclosed parameter list at position {0}")]
  UnclosedParameters(usize),
  #[error("Trailing input at position {0}")]
  TrailingInput(usize),
  #[error("Parameters nested deeper than {max_depth} levels at position {position}")]
  TooDeep { position: usize, max_depth: usize },
}

/// Deepest parameter nesting a signature may have.
pub const MAX_SIGNATURE_DEPTH: usize = 64;

impl FromStr for TypeDescriptor {
  type Err = TypeDescriptorParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut parser = SignatureParser { input: s, position: 0 };
    let descriptor = parser.parse_descriptor(0)?;
    parser.skip_whitespace();
    if parser.position < s.len() {
      return Err(TypeDescriptorParseError::TrailingInput(parser.position));
    }
    Ok(descriptor)
  }
}

struct SignatureParser<'a> {
  input: &'a str,
  position: usize,
}

impl SignatureParser<'_> {
  fn peek(&self) -> Option<char> {
    self.input[self.position..].chars().next()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.position += c.len_utf8();
    Some(c)
  }

  fn skip_whitespace(&mut self) {
    while matches!(self.peek(), Some(c) if c.is_whitespace()) {
      self.bump();
    }
  }

  fn parse_descriptor(&mut self, depth: usize) -> Result<TypeDescriptor, TypeDescriptorParseError> {
    self.skip_whitespace();
    let start = self.position;
    while let Some(c) = self.peek() {
      if matches!(c, '<' | '>' | ',') || c.is_whitespace() {
        break;
      }
      self.bump();
    }
    if start == self.position {
      return Err(match self.peek() {
        Some(found) => TypeDescriptorParseError::UnexpectedCharacter {
          position: self.position,
          found,
        },
        None => TypeDescriptorParseError::EmptyName(self.position),
      });
    }
    let base_name = self.input[start..self.position].to_string();

    self.skip_whitespace();
    if self.peek() != Some('<') {
      return Ok(TypeDescriptor::of(base_name));
    }
    if depth >= MAX_SIGNATURE_DEPTH {
      return Err(TypeDescriptorParseError::TooDeep {
        position: self.position,
        max_depth: MAX_SIGNATURE_DEPTH,
      });
    }
    self.bump();

    let mut parameter_types = Vec::new();
    loop {
      parameter_types.push(self.parse_descriptor(depth + 1)?);
      self.skip_whitespace();
      match self.bump() {
        Some(',') => continue,
        Some('>') => break,
        Some(found) => {
          return Err(TypeDescriptorParseError::UnexpectedCharacter {
            position: self.position - found.len_utf8(),
            found,
          })
        }
        None => return Err(TypeDescriptorParseError::UnclosedParameters(self.position)),
      }
    }
    Ok(TypeDescriptor::generic(base_name, parameter_types))
  }
}

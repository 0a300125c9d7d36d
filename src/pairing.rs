//! Substitution tables for [`Bdd::replace`] and [`Bdd::vec_compose`].
//!
//! A [`Pairing`] maps variables either to other variables or to arbitrary
//! functions. Every pairing carries an identifier that changes on every
//! mutation, so memoized substitution results can never be confused between
//! two different mappings.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bdd::Bdd;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::Var;

static NEXT_PAIRING_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_id() -> u64 {
    NEXT_PAIRING_ID.fetch_add(1, Ordering::Relaxed)
}

/// What a variable is replaced with.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Image {
    Var(Var),
    Func(Ref),
}

/// A variable substitution.
///
/// Function images are plain handles: the caller keeps them referenced for
/// as long as the pairing is in use.
#[derive(Debug, Clone)]
pub struct Pairing {
    images: Vec<Option<Image>>,
    id: u64,
}

impl Pairing {
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            id: fresh_id(),
        }
    }

    /// Identifier of the current contents.
    pub fn id(&self) -> u64 {
        self.id
    }

    fn set(&mut self, old: Var, image: Image) {
        if self.images.len() <= old.index() {
            self.images.resize(old.index() + 1, None);
        }
        self.images[old.index()] = Some(image);
        self.id = fresh_id();
    }

    /// Maps `old` to the variable `new`.
    pub fn set_var(&mut self, old: Var, new: Var) {
        self.set(old, Image::Var(new));
    }

    /// Maps `old[i]` to `new[i]` for every `i`.
    pub fn set_vars(&mut self, old: &[Var], new: &[Var]) -> Result<()> {
        if old.len() != new.len() {
            return Err(BddError::invalid_argument(format!(
                "pairing arrays differ in length: {} vs {}",
                old.len(),
                new.len()
            )));
        }
        for (&o, &n) in old.iter().zip(new) {
            self.set_var(o, n);
        }
        Ok(())
    }

    /// Maps `old` to the function `f`.
    pub fn set_func(&mut self, old: Var, f: Ref) {
        self.set(old, Image::Func(f));
    }

    /// Maps `old[i]` to `funcs[i]` for every `i`.
    pub fn set_funcs(&mut self, old: &[Var], funcs: &[Ref]) -> Result<()> {
        if old.len() != funcs.len() {
            return Err(BddError::invalid_argument(format!(
                "pairing arrays differ in length: {} vs {}",
                old.len(),
                funcs.len()
            )));
        }
        for (&o, &f) in old.iter().zip(funcs) {
            self.set_func(o, f);
        }
        Ok(())
    }

    /// Removes every mapping.
    pub fn reset(&mut self) {
        self.images.clear();
        self.id = fresh_id();
    }

    /// Releases the pairing.
    pub fn free(self) {}

    pub fn get(&self, var: Var) -> Option<Image> {
        self.images.get(var.index()).copied().flatten()
    }

    /// Mapped variables with their images, by variable id.
    pub fn iter(&self) -> impl Iterator<Item = (Var, Image)> + '_ {
        self.images
            .iter()
            .enumerate()
            .filter_map(|(i, img)| img.map(|img| (Var::new(i as u32), img)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Function images, which substitution operations must keep alive.
    pub(crate) fn funcs(&self) -> Vec<Ref> {
        self.iter()
            .filter_map(|(_, img)| match img {
                Image::Func(f) => Some(f),
                Image::Var(_) => None,
            })
            .collect()
    }
}

impl Default for Pairing {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (v, img)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match img {
                Image::Var(w) => write!(f, "{} -> {}", v, w)?,
                Image::Func(g) => write!(f, "{} -> {}", v, g)?,
            }
        }
        write!(f, "}}")
    }
}

impl Bdd {
    /// Creates an empty pairing.
    pub fn make_pair(&self) -> Pairing {
        Pairing::new()
    }

    /// Checks that every variable mentioned by `pairing` is declared.
    pub(crate) fn check_pairing(&self, pairing: &Pairing) -> Result<()> {
        for (v, img) in pairing.iter() {
            self.check_var(v)?;
            match img {
                Image::Var(w) => self.check_var(w)?,
                Image::Func(g) => self.check_ref(g)?,
            }
        }
        Ok(())
    }
}

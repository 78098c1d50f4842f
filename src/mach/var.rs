use super::Val;
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

const MAX_ELEMENTS: usize = u16::max_value() as usize;

/// Stable reference to a scalar, kept by FOR loops across iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarHandle(usize);

#[derive(Debug)]
struct Array {
    dims: Vec<usize>,
    data: Vec<Val>,
}

/// ## Variable memory

#[derive(Debug)]
pub struct Var {
    names: HashMap<Rc<str>, VarHandle>,
    slots: Vec<Val>,
    arrays: HashMap<Rc<str>, Array>,
    deftype: [u8; 26],
}

impl Default for Var {
    fn default() -> Var {
        Var::new()
    }
}

impl Var {
    pub fn new() -> Var {
        Var {
            names: HashMap::default(),
            slots: vec![],
            arrays: HashMap::default(),
            deftype: [b'!'; 26],
        }
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.slots.clear();
        self.arrays.clear();
        self.deftype = [b'!'; 26];
    }

    /// Appends the default type suffix to names without one.
    pub fn complete_name(&self, name: &str) -> Rc<str> {
        match name.bytes().last() {
            Some(b'$') | Some(b'%') | Some(b'!') | Some(b'#') => name.into(),
            _ => {
                let first = name.bytes().next().unwrap_or(b'A').to_ascii_uppercase();
                let idx = first.wrapping_sub(b'A') as usize;
                let typechar = self.deftype.get(idx).copied().unwrap_or(b'!');
                format!("{}{}", name, typechar as char).into()
            }
        }
    }

    pub fn set_deftype(&mut self, first: u8, last: u8, typechar: u8) {
        let first = first.to_ascii_uppercase();
        let last = last.to_ascii_uppercase();
        for letter in first..=last {
            if letter.is_ascii_uppercase() {
                self.deftype[(letter - b'A') as usize] = typechar;
            }
        }
    }

    pub fn handle(&mut self, var_name: &Rc<str>) -> Result<VarHandle> {
        if let Some(h) = self.names.get(var_name) {
            return Ok(*h);
        }
        if self.slots.len() >= MAX_ELEMENTS {
            return Err(error!(OutOfMemory));
        }
        let h = VarHandle(self.slots.len());
        self.slots.push(Val::default_for(typechar(var_name)));
        self.names.insert(var_name.clone(), h);
        Ok(h)
    }

    pub fn value(&self, handle: VarHandle) -> Val {
        match self.slots.get(handle.0) {
            Some(val) => val.clone(),
            None => Val::Single(0.0),
        }
    }

    pub fn mutate(&mut self, handle: VarHandle, value: Val) -> Result<()> {
        match self.slots.get_mut(handle.0) {
            Some(slot) => {
                let value = value.coerce(slot.typechar())?;
                *slot = value;
                Ok(())
            }
            None => Err(error!(InternalError; "STALE VARIABLE")),
        }
    }

    pub fn fetch(&self, var_name: &Rc<str>) -> Val {
        match self.names.get(var_name) {
            Some(h) => self.value(*h),
            None => Val::default_for(typechar(var_name)),
        }
    }

    pub fn store(&mut self, var_name: &Rc<str>, value: Val) -> Result<()> {
        let value = value.coerce(typechar(var_name))?;
        check_length(&value)?;
        let h = self.handle(var_name)?;
        self.mutate(h, value)
    }

    pub fn fetch_array(&mut self, var_name: &Rc<str>, indices: &[i16]) -> Result<Val> {
        let idx = self.element(var_name, indices)?;
        match self.arrays.get(var_name) {
            Some(array) => Ok(array.data[idx].clone()),
            None => Err(error!(InternalError)),
        }
    }

    pub fn store_array(&mut self, var_name: &Rc<str>, indices: &[i16], value: Val) -> Result<()> {
        let value = value.coerce(typechar(var_name))?;
        check_length(&value)?;
        let idx = self.element(var_name, indices)?;
        if let Some(array) = self.arrays.get_mut(var_name) {
            array.data[idx] = value;
        }
        Ok(())
    }

    pub fn dimension_array(&mut self, var_name: &Rc<str>, dims: &[i16]) -> Result<()> {
        if self.arrays.contains_key(var_name) {
            return Err(error!(DuplicateDefinition));
        }
        let mut sizes = vec![];
        for d in dims {
            match usize::try_from(*d) {
                Ok(d) => sizes.push(d),
                Err(_) => return Err(error!(IllegalFunctionCall)),
            }
        }
        self.allocate(var_name, sizes)
    }

    pub fn erase_array(&mut self, var_name: &Rc<str>) -> Result<()> {
        match self.arrays.remove(var_name) {
            Some(_) => Ok(()),
            None => Err(error!(IllegalFunctionCall)),
        }
    }

    fn allocate(&mut self, var_name: &Rc<str>, dims: Vec<usize>) -> Result<()> {
        let mut count: usize = 1;
        for d in &dims {
            count = count.saturating_mul(d + 1);
        }
        if count > MAX_ELEMENTS {
            return Err(error!(OutOfMemory));
        }
        let data = vec![Val::default_for(typechar(var_name)); count];
        self.arrays.insert(var_name.clone(), Array { dims, data });
        Ok(())
    }

    fn element(&mut self, var_name: &Rc<str>, indices: &[i16]) -> Result<usize> {
        if !self.arrays.contains_key(var_name) {
            self.allocate(var_name, vec![10; indices.len()])?;
        }
        let array = match self.arrays.get(var_name) {
            Some(array) => array,
            None => return Err(error!(InternalError)),
        };
        if array.dims.len() != indices.len() {
            return Err(error!(SubscriptOutOfRange));
        }
        let mut idx = 0;
        for (i, d) in indices.iter().zip(&array.dims) {
            let i = match usize::try_from(*i) {
                Ok(i) if i <= *d => i,
                _ => return Err(error!(SubscriptOutOfRange)),
            };
            idx = idx * (d + 1) + i;
        }
        Ok(idx)
    }
}

fn typechar(var_name: &str) -> u8 {
    var_name.bytes().last().unwrap_or(b'!')
}

fn check_length(value: &Val) -> Result<()> {
    match value {
        Val::String(s) if s.chars().count() > 255 => {
            Err(error!(StringTooLong; "MAXIMUM STRING LENGTH IS 255"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_coercion() {
        let mut var = Var::new();
        let a: Rc<str> = "A%".into();
        assert_eq!(var.fetch(&a), Val::Integer(0));
        var.store(&a, Val::Single(2.5)).unwrap();
        assert_eq!(var.fetch(&a), Val::Integer(3));
        let s: Rc<str> = "S$".into();
        assert!(var.store(&s, Val::Integer(1)).is_err());
    }

    #[test]
    fn test_deftype() {
        let mut var = Var::new();
        assert_eq!(&*var.complete_name("X"), "X!");
        var.set_deftype(b'I', b'N', b'%');
        assert_eq!(&*var.complete_name("J1"), "J1%");
        assert_eq!(&*var.complete_name("J1#"), "J1#");
    }

    #[test]
    fn test_handle_survives_stores() {
        let mut var = Var::new();
        let i: Rc<str> = "I!".into();
        let h = var.handle(&i).unwrap();
        var.store(&i, Val::Integer(4)).unwrap();
        assert_eq!(var.value(h), Val::Single(4.0));
        var.mutate(h, Val::Integer(5)).unwrap();
        assert_eq!(var.fetch(&i), Val::Single(5.0));
    }

    #[test]
    fn test_arrays() {
        let mut var = Var::new();
        let a: Rc<str> = "A!".into();
        var.store_array(&a, &[10], Val::Integer(1)).unwrap();
        assert_eq!(var.fetch_array(&a, &[10]), Ok(Val::Single(1.0)));
        assert!(var.fetch_array(&a, &[11]).is_err());
        assert_eq!(var.dimension_array(&a, &[5]), Err(error!(DuplicateDefinition)));
        var.erase_array(&a).unwrap();
        var.dimension_array(&a, &[2, 3]).unwrap();
        var.store_array(&a, &[2, 3], Val::Integer(7)).unwrap();
        assert_eq!(var.fetch_array(&a, &[2, 3]), Ok(Val::Single(7.0)));
        assert_eq!(var.fetch_array(&a, &[0, 0]), Ok(Val::Single(0.0)));
    }
}

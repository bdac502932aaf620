//! The generator whose routine is running on this thread.
//!
//! A yield deep inside a routine finds its generator through this slot
//! rather than through a handle threaded through every frame.
//! The slot is thread-local, so generators driven on different threads
//! never see each other. Each resume saves the previous occupant and
//! restores it when control comes back, so a routine may drive other
//! generators, including ones with the same value type.

use {
    crate::{Error, Result, generator::Shared},
    std::{
        any::{TypeId, type_name},
        cell::Cell,
        ptr::NonNull,
    },
};

/// Occupant of the slot.
#[derive(Clone, Copy)]
struct Current
{
    /// Points to a `Shared<T>` where `T` is described by the fields below.
    shared: NonNull<()>,

    type_id: TypeId,
    type_name: &'static str,
}

thread_local!
{
    static CURRENT: Cell<Option<Current>> = const { Cell::new(None) };
}

/// Restores the previous occupant of the slot when dropped.
pub (crate) struct Enter
{
    previous: Option<Current>,
}

/// Make `shared` the occupant of the slot until the guard is dropped.
pub (crate) fn enter<T>(shared: &Shared<T>) -> Enter
    where T: 'static
{
    let current = Current{
        shared: NonNull::from(shared).cast(),
        type_id: TypeId::of::<T>(),
        type_name: type_name::<T>(),
    };
    let previous = CURRENT.with(|slot| slot.replace(Some(current)));
    Enter{previous}
}

impl Drop for Enter
{
    fn drop(&mut self)
    {
        CURRENT.with(|slot| slot.set(self.previous));
    }
}

/// The occupant of the slot, if it yields values of type `T`.
pub (crate) fn get<T>() -> Result<NonNull<Shared<T>>>
    where T: 'static
{
    let current = CURRENT.with(Cell::get).ok_or(Error::NotInRoutine)?;

    if current.type_id != TypeId::of::<T>() {
        return Err(Error::TypeMismatch{
            expected: current.type_name,
            found: type_name::<T>(),
        });
    }

    Ok(current.shared.cast())
}

use super::{Spin, SpinRelax};
use core::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

pub struct SpinGuard<'a, T, R = SpinRelax>
where
    T: ?Sized,
{
    lock: &'a Spin<T, R>,
    value: &'a mut T,
    /// We don't want this to be `Send` because the lock is held on behalf of
    /// the acquiring cpu and must be released there.
    _not_send: PhantomData<*mut ()>,
}

impl<'a, T, R> SpinGuard<'a, T, R>
where
    T: ?Sized,
{
    pub(super) fn new(lock: &'a Spin<T, R>, value: &'a mut T) -> Self {
        Self {
            lock,
            value,
            _not_send: PhantomData,
        }
    }
}

// SAFETY: As long as the value protected by the lock is able to be shared between threads,
//         we can access the guard from multiple threads.
unsafe impl<T, R> Sync for SpinGuard<'_, T, R> where T: ?Sized + Sync {}

impl<T, R> Drop for SpinGuard<'_, T, R>
where
    T: ?Sized,
{
    fn drop(&mut self) {
        unsafe {
            // SAFETY: We are dropping the guard, so we are not holding the lock anymore.
            self.lock.do_unlock();
        }
    }
}

impl<T, R> Deref for SpinGuard<'_, T, R>
where
    T: ?Sized,
{
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: We are holding the lock, so we can safely access the value.
        self.value
    }
}

impl<T, R> DerefMut for SpinGuard<'_, T, R>
where
    T: ?Sized,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: We are holding the lock, so we can safely access the value.
        self.value
    }
}

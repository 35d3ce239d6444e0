/// A key together with the payload that was attached to it on insertion.
///
/// `data` is `None` only when no payload was supplied. Payloads that are conventionally empty,
/// such as `0`, `""` or `false`, are stored as `Some` and kept distinct.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<T, U> {
    pub key: T,
    pub data: Option<U>,
}

impl<T, U> Entry<T, U> {
    pub fn into_pair(self) -> (T, Option<U>) {
        let Entry { key, data } = self;
        (key, data)
    }
}

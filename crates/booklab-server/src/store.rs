use std::sync::Arc;

use heed::{types::*, Database, Env, EnvOpenOptions};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    auth::UserAccount,
    config::BookLabConfig,
    error::{CatalogError, CatalogResult},
    record::{BookPatch, BookRecord},
};

const BOOK_DB: &str = "books";
const USER_DB: &str = "users";

/// Embedded document store: one LMDB environment with a `books` database
/// keyed by record id and a `users` database keyed by email. Every
/// operation runs in its own transaction; atomicity is per record.
#[derive(Clone)]
pub struct RecordStore {
    env: Arc<Env>,
    books: Database<Str, SerdeBincode<BookRecord>>,
    users: Database<Str, SerdeBincode<UserAccount>>,
}

impl RecordStore {
    pub fn new(config: &BookLabConfig) -> CatalogResult<Self> {
        config.ensure_dirs()?;
        let path = config.data_dir.join("lmdb");
        std::fs::create_dir_all(&path).map_err(|err| CatalogError::Storage(err.to_string()))?;
        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(8)
                .map_size(1024 * 1024 * 1024)
                .open(path.as_path())
        }
        .map_err(|err| CatalogError::Storage(err.to_string()))?;
        let env = Arc::new(env);
        let mut txn = env
            .write_txn()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        let books = open_db(&env, &mut txn, BOOK_DB)?;
        let users = open_db(&env, &mut txn, USER_DB)?;
        txn.commit()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        Ok(Self { env, books, users })
    }

    pub fn insert_book(&self, book: &BookRecord) -> CatalogResult<()> {
        self.put(&self.books, &book.id, book)
    }

    pub fn get_book(&self, id: &str) -> CatalogResult<Option<BookRecord>> {
        self.get(&self.books, id)
    }

    /// All records, newest first.
    pub fn list_books(&self) -> CatalogResult<Vec<BookRecord>> {
        let mut books = self.collect_all(&self.books)?;
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(books)
    }

    /// Read-modify-write inside a single write transaction. `None` when
    /// the id does not resolve to a record.
    pub fn update_book(&self, id: &str, patch: BookPatch) -> CatalogResult<Option<BookRecord>> {
        let mut txn = self
            .env
            .write_txn()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        let Some(mut book) = self
            .books
            .get(&txn, id)
            .map_err(|err| CatalogError::Storage(err.to_string()))?
        else {
            return Ok(None);
        };
        patch.apply(&mut book);
        self.books
            .put(&mut txn, id, &book)
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        txn.commit()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        Ok(Some(book))
    }

    /// `false` when the id does not resolve to a record.
    pub fn delete_book(&self, id: &str) -> CatalogResult<bool> {
        let mut txn = self
            .env
            .write_txn()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        let removed = self
            .books
            .delete(&mut txn, id)
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        txn.commit()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        Ok(removed)
    }

    pub fn put_user(&self, user: &UserAccount) -> CatalogResult<()> {
        self.put(&self.users, &user.email, user)
    }

    pub fn find_user_by_email(&self, email: &str) -> CatalogResult<Option<UserAccount>> {
        self.get(&self.users, email)
    }

    fn put<T: Serialize>(
        &self,
        db: &Database<Str, SerdeBincode<T>>,
        key: &str,
        value: &T,
    ) -> CatalogResult<()> {
        let mut txn = self
            .env
            .write_txn()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        db.put(&mut txn, key, value)
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        txn.commit()
            .map_err(|err| CatalogError::Storage(err.to_string()))
    }

    fn get<T: DeserializeOwned>(
        &self,
        db: &Database<Str, SerdeBincode<T>>,
        key: &str,
    ) -> CatalogResult<Option<T>> {
        let txn = self
            .env
            .read_txn()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        db.get(&txn, key)
            .map_err(|err| CatalogError::Storage(err.to_string()))
    }

    fn collect_all<T: DeserializeOwned>(
        &self,
        db: &Database<Str, SerdeBincode<T>>,
    ) -> CatalogResult<Vec<T>> {
        let txn = self
            .env
            .read_txn()
            .map_err(|err| CatalogError::Storage(err.to_string()))?;
        let mut result = Vec::new();
        for item in db
            .iter(&txn)
            .map_err(|err| CatalogError::Storage(err.to_string()))?
        {
            let (_, value) = item.map_err(|err| CatalogError::Storage(err.to_string()))?;
            result.push(value);
        }
        Ok(result)
    }
}

fn open_db<T: 'static>(
    env: &Arc<Env>,
    txn: &mut heed::RwTxn,
    name: &str,
) -> CatalogResult<Database<Str, SerdeBincode<T>>> {
    env.create_database(txn, Some(name))
        .map_err(|err| CatalogError::Storage(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BookSubmission;
    use chrono::{Duration, Utc};

    fn store() -> (RecordStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = BookLabConfig {
            data_dir: dir.path().to_path_buf(),
            ..BookLabConfig::default()
        };
        (RecordStore::new(&config).expect("store"), dir)
    }

    fn book(title: &str, offset_secs: i64) -> BookRecord {
        let mut record = BookRecord::new(
            BookSubmission {
                title: title.to_string(),
                author: "Herbert".to_string(),
                publisher: "Chilton".to_string(),
                published_date: "1965".to_string(),
                pages: "412".to_string(),
                description: "A classic".to_string(),
            },
            None,
        );
        record.created_at = Utc::now() + Duration::seconds(offset_secs);
        record
    }

    #[test]
    fn list_is_ordered_newest_first() {
        let (store, _dir) = store();
        for (title, offset) in [("A", 0), ("B", 1), ("C", 2)] {
            store.insert_book(&book(title, offset)).expect("insert");
        }
        let titles: Vec<String> = store
            .list_books()
            .expect("list")
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["C", "B", "A"]);
    }

    #[test]
    fn update_overwrites_present_fields_only() {
        let (store, _dir) = store();
        let mut original = book("Dune", 0);
        original.image = Some("/uploads/cover.png".to_string());
        store.insert_book(&original).expect("insert");

        let patch = BookPatch {
            title: Some("Dune Messiah".to_string()),
            ..BookPatch::default()
        };
        let updated = store
            .update_book(&original.id, patch)
            .expect("update")
            .expect("record exists");
        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.author, original.author);
        assert_eq!(updated.pages, original.pages);
        assert_eq!(updated.image, original.image);

        let reloaded = store.get_book(&original.id).expect("get").expect("exists");
        assert_eq!(reloaded.title, "Dune Messiah");
    }

    #[test]
    fn update_unknown_id_is_none() {
        let (store, _dir) = store();
        let outcome = store
            .update_book("missing", BookPatch::default())
            .expect("update");
        assert!(outcome.is_none());
    }

    #[test]
    fn delete_removes_and_second_delete_misses() {
        let (store, _dir) = store();
        let record = book("Dune", 0);
        store.insert_book(&record).expect("insert");
        assert!(store.delete_book(&record.id).expect("first delete"));
        assert!(store.list_books().expect("list").is_empty());
        assert!(!store.delete_book(&record.id).expect("second delete"));
    }

    #[test]
    fn users_are_keyed_by_email() {
        let (store, _dir) = store();
        let user = UserAccount::new("reader@booklab.dev", "correct horse battery")
            .expect("account");
        store.put_user(&user).expect("put");
        let found = store
            .find_user_by_email("reader@booklab.dev")
            .expect("find")
            .expect("present");
        assert_eq!(found.id, user.id);
        assert!(store
            .find_user_by_email("other@booklab.dev")
            .expect("find")
            .is_none());
    }
}

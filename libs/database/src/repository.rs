use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, DeleteResult, EntityTrait, IntoActiveModel, PrimaryKeyTrait, TransactionTrait,
};
use std::marker::PhantomData;

/// Shared CRUD plumbing for entities keyed by a `BIGINT` primary key.
///
/// Every operation takes the connection explicitly through the `*_in`
/// variants so repositories can run them on a transaction; the plain
/// variants use the pool.
pub struct BaseRepository<E: EntityTrait> {
    db: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Clone for BaseRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> BaseRepository<E>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i64>,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.db.begin().await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<E::Model>, DbErr> {
        Self::find_by_id_in(&self.db, id).await
    }

    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: i64,
    ) -> Result<Option<E::Model>, DbErr> {
        E::find_by_id(id).one(conn).await
    }

    pub async fn insert<A>(&self, model: A) -> Result<E::Model, DbErr>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        Self::insert_in(&self.db, model).await
    }

    pub async fn insert_in<C, A>(conn: &C, model: A) -> Result<E::Model, DbErr>
    where
        C: ConnectionTrait,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        model.insert(conn).await
    }

    pub async fn update<A>(&self, model: A) -> Result<E::Model, DbErr>
    where
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        Self::update_in(&self.db, model).await
    }

    pub async fn update_in<C, A>(conn: &C, model: A) -> Result<E::Model, DbErr>
    where
        C: ConnectionTrait,
        A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        E::Model: IntoActiveModel<A>,
    {
        model.update(conn).await
    }

    /// Permanently remove a row; soft delete is a plain `update`
    pub async fn hard_delete(&self, id: i64) -> Result<u64, DbErr> {
        let result: DeleteResult = E::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }
}

use super::ObjectModel;
use crate::context::ModelContext;
use crate::entity::Entity;
use crate::errors::ObjectModelResult;
use remote_client::AttrValue;

impl<E: Entity> ObjectModel<E> {
    /// Build, fill and save a model in one go
    pub async fn create<I, K, V>(context: &ModelContext, data: I) -> ObjectModelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let mut model = Self::with_data(context, data);
        model.save().await?;
        Ok(model)
    }

    /// Every object of the entity's class
    pub async fn all(context: &ModelContext) -> ObjectModelResult<Vec<Self>> {
        E::query(context).get(None).await
    }

    /// Create when there is no id yet, update otherwise
    pub async fn save(&mut self) -> ObjectModelResult<&mut Self> {
        self.object
            .save(self.context.store(), self.context.use_master_key())
            .await?;
        self.fetched = true;
        Ok(self)
    }

    /// Delete the object remotely. Use [`remove_key`](Self::remove_key) to
    /// drop a single attribute.
    pub async fn delete(&self) -> ObjectModelResult<()> {
        self.object
            .destroy(self.context.store(), self.context.use_master_key())
            .await?;
        Ok(())
    }

    pub async fn update<I, K, V>(&mut self, data: I) -> ObjectModelResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        self.fill(data);
        self.save().await
    }

    /// Load the stored data unless it was already loaded; `force` reloads
    pub async fn fetch(&mut self, force: bool) -> ObjectModelResult<&mut Self> {
        if !self.fetched || force {
            self.object
                .fetch(self.context.store(), self.context.use_master_key())
                .await?;
            self.fetched = true;
        }
        Ok(self)
    }
}

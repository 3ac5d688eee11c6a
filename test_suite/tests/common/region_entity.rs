use sea_orm::{QueryOrder, entity::prelude::*};
use searchcrate::{FilterBinding, FilterSet, SortRegistry, TextFilter, async_trait, Searchable};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "regions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegionFilters {
    pub name: Option<TextFilter>,
    pub code: Option<TextFilter>,
}

impl FilterSet for RegionFilters {
    type Column = Column;

    fn bindings(&self) -> Vec<FilterBinding<Column>> {
        [
            FilterBinding::optional("name", Column::Name, self.name.as_ref()),
            FilterBinding::optional("code", Column::Code, self.code.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn multi_value_fields() -> &'static [&'static str] {
        &["code"]
    }
}

pub static SORTS: LazyLock<SortRegistry<Entity>> = LazyLock::new(|| {
    SortRegistry::new("Region")
        .add("name", Column::Name)
        .add("code", Column::Code)
});

pub struct RegionSearch;

#[async_trait]
impl Searchable for RegionSearch {
    type Entity = Entity;
    type Filters = RegionFilters;
    type Output = Model;

    const RESOURCE_NAME: &'static str = "regions";

    fn sort_registry() -> &'static SortRegistry<Entity> {
        &SORTS
    }

    fn default_ordering(query: Select<Entity>) -> Select<Entity> {
        query.order_by_asc(Column::Name)
    }
}

use sea_orm::{QueryOrder, entity::prelude::*};
use searchcrate::{
    FilterBinding, FilterSet, IdListFilter, NumberFilter, Searchable, SortRegistry, TextFilter,
    async_trait,
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub name: String,
    pub population: i64,
    pub region_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CityFilters {
    pub name: Option<TextFilter>,
    pub population: Option<NumberFilter>,
    pub region_ids: Option<IdListFilter>,
}

impl FilterSet for CityFilters {
    type Column = Column;

    fn bindings(&self) -> Vec<FilterBinding<Column>> {
        [
            FilterBinding::optional("name", Column::Name, self.name.as_ref()),
            FilterBinding::optional("population", Column::Population, self.population.as_ref()),
            FilterBinding::optional("region_ids", Column::RegionId, self.region_ids.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

pub static SORTS: LazyLock<SortRegistry<Entity>> = LazyLock::new(|| {
    SortRegistry::new("City")
        .add("name", Column::Name)
        .add("population", Column::Population)
        .add("regionId", Column::RegionId)
        .with_tiebreaker(Column::Id)
});

pub struct CitySearch;

#[async_trait]
impl Searchable for CitySearch {
    type Entity = Entity;
    type Filters = CityFilters;
    type Output = Model;

    const RESOURCE_NAME: &'static str = "cities";

    fn sort_registry() -> &'static SortRegistry<Entity> {
        &SORTS
    }

    fn default_ordering(query: Select<Entity>) -> Select<Entity> {
        query.order_by_asc(Column::Name)
    }
}

//! Research assistant facade wiring storage, providers and services

use std::sync::Arc;
use tokio::sync::RwLock;

use scholar_core::{
    AnalysisRequest, AnalysisResponse, Embedder, Error, LLMProvider,
    OcrEngine, PaperCatalog, PaperRecord, PaperSearchProvider, PaperSearchRequest,
    PaperSearchResponse, QnARequest, QnAResponse, ResearchReply, Result, Scraper, SummaryRequest,
    TrendsRequest, TrendsResponse, UploadRegistry, UploadedFile, WebSearch,
};

use crate::agent::ResearchAgent;
use crate::analysis::AnalysisService;
use crate::catalog::{FilePaperCatalog, FileUploadRegistry};
use crate::chunker::TextSplitter;
use crate::config::AssistantSettings;
use crate::extraction::TextExtractor;
use crate::paper_index::PaperIndex;
use crate::qna::QnAService;
use crate::registry::DocumentStoreRegistry;
use crate::search::{ArxivClient, GoogleScholarClient, PubMedClient, SearchService};
use crate::summarize::Summarizer;
use crate::trends::TrendsService;
use crate::web::{FirecrawlClient, SerperClient};

/// External collaborators the assistant delegates to
pub struct Collaborators {
    pub llm: Arc<dyn LLMProvider>,
    pub embedder: Arc<dyn Embedder>,
    pub ocr: Option<Arc<dyn OcrEngine>>,
    /// Sources queried by paper search
    pub search_providers: Vec<Arc<dyn PaperSearchProvider>>,
    /// Source queried for publication trends
    pub trends_provider: Arc<dyn PaperSearchProvider>,
    /// Web tools of the research agent; the agent is off unless both are set
    pub web_search: Option<Arc<dyn WebSearch>>,
    pub scraper: Option<Arc<dyn Scraper>>,
}

impl Collaborators {
    /// arXiv and PubMed for search, plus Google Scholar when a SerpAPI key
    /// is set; arXiv for trends; Serper and Firecrawl when both keys are set
    pub fn with_default_sources(
        settings: &AssistantSettings,
        llm: Arc<dyn LLMProvider>,
        embedder: Arc<dyn Embedder>,
        ocr: Option<Arc<dyn OcrEngine>>,
    ) -> Result<Self> {
        let arxiv: Arc<dyn PaperSearchProvider> = Arc::new(ArxivClient::new()?);
        let pubmed: Arc<dyn PaperSearchProvider> =
            Arc::new(PubMedClient::new(settings.entrez_email.clone())?);

        let mut search_providers = vec![arxiv.clone(), pubmed];
        if let Some(ref key) = settings.serpapi_api_key {
            search_providers.push(Arc::new(GoogleScholarClient::new(key.clone())?));
        }

        let mut web_search: Option<Arc<dyn WebSearch>> = None;
        let mut scraper: Option<Arc<dyn Scraper>> = None;
        if let (Some(serper), Some(firecrawl)) =
            (&settings.serper_api_key, &settings.firecrawl_api_key)
        {
            web_search = Some(Arc::new(SerperClient::new(serper.clone())?));
            scraper = Some(Arc::new(FirecrawlClient::new(firecrawl.clone())?));
        }

        Ok(Self {
            llm,
            embedder,
            ocr,
            search_providers,
            trends_provider: arxiv,
            web_search,
            scraper,
        })
    }
}

pub struct ResearchAssistant {
    settings: AssistantSettings,
    catalog: Arc<dyn PaperCatalog>,
    qna: QnAService,
    analysis: AnalysisService,
    search: SearchService,
    trends: TrendsService,
    summarizer: Summarizer,
    research: Option<ResearchAgent>,
}

impl ResearchAssistant {
    pub fn new(settings: AssistantSettings, collaborators: Collaborators) -> Result<Self> {
        let Collaborators {
            llm,
            embedder,
            ocr,
            search_providers,
            trends_provider,
            web_search,
            scraper,
        } = collaborators;

        let mut extractor = TextExtractor::new()?;
        if let Some(ocr) = ocr {
            extractor = extractor.with_ocr(ocr);
        }
        let extractor = Arc::new(extractor);

        let catalog: Arc<dyn PaperCatalog> =
            Arc::new(FilePaperCatalog::new(&settings.catalog_path)?);
        let uploads: Arc<dyn UploadRegistry> =
            Arc::new(FileUploadRegistry::new(&settings.uploads_path)?);

        let stores = Arc::new(DocumentStoreRegistry::new(
            &settings.document_index_dir,
            embedder.clone(),
            extractor.clone(),
            settings.indexing.clone(),
        ));

        let paper_index = Arc::new(RwLock::new(PaperIndex::load_or_create(
            &settings.paper_index_path,
        )));

        let qna = QnAService::new(
            uploads,
            stores,
            embedder.clone(),
            llm.clone(),
            &settings.upload_dir,
        );

        let analysis = AnalysisService::new(
            catalog.clone(),
            paper_index,
            extractor,
            embedder,
            llm.clone(),
        )
        .with_splitter(TextSplitter::from_config(&settings.indexing)?);

        let search = search_providers
            .into_iter()
            .fold(SearchService::new(catalog.clone()), |service, provider| {
                service.with_provider(provider)
            });

        let research = match (web_search, scraper) {
            (Some(web_search), Some(scraper)) => {
                Some(ResearchAgent::new(llm.clone(), web_search, scraper))
            }
            _ => None,
        };

        tracing::info!(
            model = llm.model_id(),
            sources = ?search.sources(),
            research_agent = research.is_some(),
            "research assistant ready"
        );

        Ok(Self {
            settings,
            catalog,
            qna,
            analysis,
            search,
            trends: TrendsService::new(trends_provider),
            summarizer: Summarizer::new(llm),
            research,
        })
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    pub async fn upload_document(
        &self,
        user_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadedFile> {
        self.qna.upload_document(user_id, file_name, bytes).await
    }

    pub async fn list_documents(&self, user_id: &str) -> Result<Vec<UploadedFile>> {
        self.qna.list_documents(user_id).await
    }

    pub async fn ask(&self, user_id: &str, request: &QnARequest) -> Result<QnAResponse> {
        self.qna.ask(user_id, request).await
    }

    pub async fn search_papers(
        &self,
        user_id: &str,
        index_id: &str,
        request: &PaperSearchRequest,
    ) -> Result<PaperSearchResponse> {
        self.search.search(user_id, index_id, request).await
    }

    pub async fn papers(&self, user_id: &str, index_id: &str) -> Result<Vec<PaperRecord>> {
        self.catalog.papers_by_index(user_id, index_id).await
    }

    pub async fn search_index_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.catalog.index_ids(user_id).await
    }

    pub async fn analyze(&self, user_id: &str, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        self.analysis.generate_report(user_id, request).await
    }

    pub async fn trends(&self, request: &TrendsRequest) -> Result<TrendsResponse> {
        self.trends.analyze(request).await
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        self.summarizer.summarize(request).await
    }

    /// Answer a question with the web research agent
    pub async fn research(&self, user_id: &str, query: &str) -> Result<ResearchReply> {
        let agent = self.research.as_ref().ok_or_else(|| {
            Error::Configuration(
                "Research chat needs SERPER_API_KEY and FIRECRAWL_API_KEY".to_string(),
            )
        })?;

        tracing::info!(user_id, "research chat query");
        agent.run(query).await
    }
}
